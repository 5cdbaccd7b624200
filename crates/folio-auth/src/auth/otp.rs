//! One-time passcodes for email verification and password reset.
//!
//! Codes are six decimal digits drawn uniformly from `100000..=999999`.
//! The engine is stateless; staging records hold the code, its expiry and
//! the attempt counter.

use std::sync::Arc;

use rand::Rng;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

/// Lifetime of every issued code (10 minutes).
pub const OTP_TTL_SECS: i64 = 10 * 60;

/// Wrong submissions allowed before the staging record is destroyed.
pub const MAX_OTP_ATTEMPTS: i64 = 5;

const OTP_LEN: usize = 6;

/// Source of fresh codes.
pub trait CodeSource: Send + Sync {
    fn next_code(&self) -> String;
}

/// Codes from the operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRngCodes;

impl CodeSource for OsRngCodes {
    fn next_code(&self) -> String {
        OsRng.gen_range(100_000..=999_999_u32).to_string()
    }
}

/// A code together with the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub expires_at: i64,
}

/// Result of comparing a submitted code with the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    Valid,
    /// Expiry is checked before the code, so this wins even on a match.
    Expired,
    Mismatch,
}

/// What a wrong submission leads to once the counter has been bumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Retry { remaining: i64 },
    Exhausted,
}

#[derive(Clone)]
pub struct OtpEngine {
    source: Arc<dyn CodeSource>,
}

impl Default for OtpEngine {
    fn default() -> Self {
        Self::new(Arc::new(OsRngCodes))
    }
}

impl OtpEngine {
    pub fn new(source: Arc<dyn CodeSource>) -> Self {
        Self { source }
    }

    pub fn generate(&self) -> String {
        self.source.next_code()
    }

    /// Generate a code valid for [`OTP_TTL_SECS`] from `now`.
    pub fn issue(&self, now: i64) -> IssuedOtp {
        IssuedOtp {
            code: self.generate(),
            expires_at: now + OTP_TTL_SECS,
        }
    }

    pub fn check(stored: &str, expires_at: i64, candidate: &str, now: i64) -> OtpCheck {
        if now >= expires_at {
            return OtpCheck::Expired;
        }
        if bool::from(stored.as_bytes().ct_eq(candidate.as_bytes())) {
            OtpCheck::Valid
        } else {
            OtpCheck::Mismatch
        }
    }

    /// Classify the attempt counter after a wrong submission was recorded.
    pub const fn after_failed_attempt(attempts: i64) -> AttemptOutcome {
        if attempts >= MAX_OTP_ATTEMPTS {
            AttemptOutcome::Exhausted
        } else {
            AttemptOutcome::Retry {
                remaining: MAX_OTP_ATTEMPTS - attempts,
            }
        }
    }

    /// Exactly six ASCII digits.
    pub fn is_well_formed(code: &str) -> bool {
        code.len() == OTP_LEN && code.bytes().all(|b| b.is_ascii_digit())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct FixedCode(&'static str);

    impl CodeSource for FixedCode {
        fn next_code(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn generated_codes_are_six_digits_in_range() {
        let engine = OtpEngine::default();
        for _ in 0..500 {
            let code = engine.generate();
            assert!(OtpEngine::is_well_formed(&code), "bad code {code}");
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn issue_sets_ten_minute_expiry() {
        let engine = OtpEngine::new(Arc::new(FixedCode("123456")));
        let otp = engine.issue(1_000);
        assert_eq!(otp.code, "123456");
        assert_eq!(otp.expires_at, 1_600);
    }

    #[test]
    fn expiry_is_checked_before_match() {
        assert_eq!(OtpEngine::check("123456", 100, "123456", 100), OtpCheck::Expired);
        assert_eq!(OtpEngine::check("123456", 100, "000000", 150), OtpCheck::Expired);
        assert_eq!(OtpEngine::check("123456", 100, "123456", 99), OtpCheck::Valid);
        assert_eq!(OtpEngine::check("123456", 100, "123457", 99), OtpCheck::Mismatch);
        assert_eq!(OtpEngine::check("123456", 100, "12345", 99), OtpCheck::Mismatch);
    }

    #[test]
    fn fifth_failure_exhausts() {
        assert_eq!(
            OtpEngine::after_failed_attempt(1),
            AttemptOutcome::Retry { remaining: 4 }
        );
        assert_eq!(
            OtpEngine::after_failed_attempt(4),
            AttemptOutcome::Retry { remaining: 1 }
        );
        assert_eq!(OtpEngine::after_failed_attempt(5), AttemptOutcome::Exhausted);
        assert_eq!(OtpEngine::after_failed_attempt(6), AttemptOutcome::Exhausted);
    }

    #[test]
    fn well_formed_codes() {
        assert!(OtpEngine::is_well_formed("012345"));
        assert!(!OtpEngine::is_well_formed("12345"));
        assert!(!OtpEngine::is_well_formed("1234567"));
        assert!(!OtpEngine::is_well_formed("12a456"));
        assert!(!OtpEngine::is_well_formed("１２３４５６"));
    }
}
