//! Translation of [`AuthError`] into HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::service::AuthError;

/// Error body sent to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<i64>,
}

#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match &self.0 {
            AuthError::Validation(_) | AuthError::OtpInvalid { .. } => StatusCode::BAD_REQUEST,
            AuthError::DuplicateUser => StatusCode::CONFLICT,
            AuthError::NoPendingRegistration | AuthError::NoResetRequest => StatusCode::NOT_FOUND,
            AuthError::OtpExpired => StatusCode::GONE,
            AuthError::AttemptsExceeded => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InvalidCredentials | AuthError::TokenInvalid | AuthError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::AccountInactive | AuthError::EmailNotVerified | AuthError::NotVerified => {
                StatusCode::FORBIDDEN
            }
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match &self.0 {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::DuplicateUser => "DUPLICATE_USER",
            AuthError::NoPendingRegistration => "NO_PENDING_REGISTRATION",
            AuthError::NoResetRequest => "NO_RESET_REQUEST",
            AuthError::OtpExpired => "OTP_EXPIRED",
            AuthError::OtpInvalid { .. } => "OTP_INVALID",
            AuthError::AttemptsExceeded => "ATTEMPTS_EXCEEDED",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountInactive => "ACCOUNT_INACTIVE",
            AuthError::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            AuthError::NotVerified => "NOT_VERIFIED",
            AuthError::TokenInvalid => "TOKEN_INVALID",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn body(&self) -> ErrorBody {
        let message = match &self.0 {
            AuthError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let remaining_attempts = match &self.0 {
            AuthError::OtpInvalid { remaining_attempts } => Some(*remaining_attempts),
            _ => None,
        };
        ErrorBody {
            success: false,
            code: self.code(),
            message,
            remaining_attempts,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self.0 {
            error!(error = %detail, "Request failed with internal error");
        }
        (self.status(), Json(self.body())).into_response()
    }
}
