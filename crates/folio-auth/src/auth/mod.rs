//! Credential primitives for the Folio auth server.
//!
//! Password hashing and token signing sit behind the [`PasswordHasher`] and
//! [`TokenSigner`] traits so algorithms and cost factors can be swapped.

pub mod claims;
pub mod jwt;
pub mod otp;
pub mod password;

pub use claims::{Claims, TokenKind};
pub use jwt::{JwtManager, hash_token};
pub use otp::{CodeSource, OsRngCodes, OtpCheck, OtpEngine};
pub use password::Argon2Hasher;

/// Password hashing failed for a reason other than a mismatch.
#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(pub String);

/// Why a token could not be issued or verified.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, malformed token or wrong token type.
    #[error("token is invalid")]
    Invalid,

    /// Signature is fine but `exp` has passed.
    #[error("token has expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// A freshly signed token and its absolute expiry (Unix seconds).
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: i64,
}

pub trait PasswordHasher: Send + Sync {
    /// Hash a password with a fresh salt.
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// Check a password against a stored hash. `Ok(false)` on mismatch.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError>;
}

pub trait TokenSigner: Send + Sync {
    fn issue(&self, user_id: &str, kind: TokenKind) -> Result<SignedToken, TokenError>;

    /// Verify signature, expiry and token type, returning the claims.
    fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError>;
}
