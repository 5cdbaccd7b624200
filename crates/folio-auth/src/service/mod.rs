//! Registration, login, password reset and session rotation.
//!
//! [`SessionController`] is the only entry point used by the HTTP layer; the
//! managers behind it each own one flow.

mod controller;
mod credentials;
mod error;
mod registration;
mod reset;
mod tokens;
pub mod validate;


pub use controller::{PurgeReport, SessionController};
pub use error::{AuthError, AuthResult};
pub use tokens::{TokenPair, TokenService};

use crate::storage::{PublicUser, User};

/// Answer to a code request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpIssued {
    pub email: String,
    /// Seconds until the code stops being accepted.
    pub expires_in: i64,
}

/// An authenticated user and their fresh tokens.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthSession {
    fn new(user: User, tokens: TokenPair) -> Self {
        Self {
            user: user.into(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

#[cfg(feature = "metrics")]
fn record(counter: &'static str, outcome: &'static str) {
    folio_core::metrics::increment(counter, outcome);
}

#[cfg(not(feature = "metrics"))]
const fn record(_counter: &'static str, _outcome: &'static str) {}
