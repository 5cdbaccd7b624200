//! Typed failures of the credential and session flows.

use thiserror::Error;

use crate::auth::{HashError, TokenError};
use crate::storage::DatabaseError;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("an account with this email already exists")]
    DuplicateUser,

    #[error("no pending registration for this email")]
    NoPendingRegistration,

    #[error("no password reset was requested for this email")]
    NoResetRequest,

    #[error("the code has expired")]
    OtpExpired,

    /// Wrong code; one attempt was consumed.
    #[error("the code is incorrect")]
    OtpInvalid { remaining_attempts: i64 },

    /// Too many wrong codes; the staging record is gone.
    #[error("too many incorrect codes, please start again")]
    AttemptsExceeded,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("email address is not verified")]
    EmailNotVerified,

    /// Password reset attempted before the OTP was confirmed.
    #[error("password reset has not been verified")]
    NotVerified,

    #[error("token is invalid")]
    TokenInvalid,

    #[error("token has expired")]
    TokenExpired,

    #[error("{0}")]
    Validation(String),

    /// Store, hashing or signing failure. Never shown to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DatabaseError> for AuthError {
    fn from(e: DatabaseError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<HashError> for AuthError {
    fn from(e: HashError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => Self::TokenInvalid,
            TokenError::Expired => Self::TokenExpired,
            TokenError::Signing(msg) => Self::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_map_to_taxonomy() {
        assert!(matches!(
            AuthError::from(TokenError::Invalid),
            AuthError::TokenInvalid
        ));
        assert!(matches!(
            AuthError::from(TokenError::Expired),
            AuthError::TokenExpired
        ));
        assert!(matches!(
            AuthError::from(TokenError::Signing("x".into())),
            AuthError::Internal(_)
        ));
    }

    #[test]
    fn store_errors_are_internal() {
        let err = AuthError::from(DatabaseError::Connection("down".into()));
        assert!(matches!(err, AuthError::Internal(_)));
    }
}
