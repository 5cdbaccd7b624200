//! Outbound email.
//!
//! The transport is an external collaborator reached through [`Mailer`].
//! Auth flows never wait on it: [`dispatch`] hands the message to a detached
//! task and failures are only logged.

#[cfg(feature = "http-mailer")]
pub mod http;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

#[cfg(feature = "http-mailer")]
pub use http::HttpMailer;
pub use templates::Mail;

/// Errors that can occur while handing a message to the transport.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// The request never got a response.
    #[error("mail request error: {0}")]
    Request(String),

    /// The mail API answered with a non-success status.
    #[error("mail API error (status {status}): {body}")]
    Api { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        info!(to, subject, "Mail transport not configured; logging message instead");
        debug!(body = html_body, "Mail body");
        Ok(())
    }
}

/// Send `mail` to `to` in the background.
///
/// Returns the task handle so tests can await delivery; production callers
/// drop it.
pub fn dispatch(
    mailer: &Arc<dyn Mailer>,
    to: String,
    mail: Mail,
) -> tokio::task::JoinHandle<()> {
    let mailer = Arc::clone(mailer);
    tokio::spawn(async move {
        match mailer.send(&to, &mail.subject, &mail.html).await {
            Ok(()) => debug!(subject = %mail.subject, "Mail dispatched"),
            Err(e) => warn!(error = %e, subject = %mail.subject, "Mail dispatch failed"),
        }
    })
}
