//! Input checks shared by every entry point.

use std::sync::LazyLock;

use regex::Regex;

use super::error::{AuthError, AuthResult};
use crate::auth::OtpEngine;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_NAME_LEN: usize = 100;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Trim and lower-case an email, rejecting anything that does not look like one.
pub fn normalize_email(raw: &str) -> AuthResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = EMAIL_RE
        .as_ref()
        .is_some_and(|re| re.is_match(&email));
    if valid {
        Ok(email)
    } else {
        Err(AuthError::Validation("a valid email address is required".into()))
    }
}

pub fn validate_password(password: &str) -> AuthResult<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_full_name(raw: &str) -> AuthResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AuthError::Validation("full name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AuthError::Validation(format!(
            "full name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn validate_otp(code: &str) -> AuthResult<()> {
    if OtpEngine::is_well_formed(code) {
        Ok(())
    } else {
        Err(AuthError::Validation("code must be exactly 6 digits".into()))
    }
}

pub fn require(value: &str, field: &str) -> AuthResult<()> {
    if value.trim().is_empty() {
        Err(AuthError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalised() {
        assert_eq!(normalize_email("  A@X.com ").unwrap(), "a@x.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("a@b").is_err());
        assert!(normalize_email("a b@x.com").is_err());
        assert!(normalize_email("").is_err());
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("Secret123!").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn full_name_is_trimmed() {
        assert_eq!(validate_full_name("  Alice ").unwrap(), "Alice");
        assert!(validate_full_name("   ").is_err());
    }

    #[test]
    fn otp_shape() {
        assert!(validate_otp("123456").is_ok());
        assert!(validate_otp("12345").is_err());
    }

    #[test]
    fn require_rejects_blank() {
        assert!(require("x", "refreshToken").is_ok());
        let err = require("  ", "refreshToken").unwrap_err();
        assert_eq!(err.to_string(), "refreshToken is required");
    }
}
