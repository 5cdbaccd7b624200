//! Transactional mail over an HTTP JSON API.
//!
//! Posts `{sender, to, subject, htmlContent}` with an `api-key` header, the
//! shape used by Brevo-style `/v3/smtp/email` endpoints.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{MailError, Mailer};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody<'a> {
    sender: EmailAddress<'a>,
    to: Vec<EmailAddress<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

/// Client for an HTTP mail API.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    sender_email: String,
    sender_name: String,
}

impl HttpMailer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
        sender_email: impl Into<String>,
        sender_name: impl Into<String>,
    ) -> Result<Self, MailError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("folio-auth/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| MailError::Request(e.to_string()))?;

        Ok(Self {
            http,
            api_url: api_url.into(),
            api_key,
            sender_email: sender_email.into(),
            sender_name: sender_name.into(),
        })
    }

    fn body<'a>(&'a self, to: &'a str, subject: &'a str, html_body: &'a str) -> SendEmailBody<'a> {
        SendEmailBody {
            sender: EmailAddress {
                email: &self.sender_email,
                name: Some(&self.sender_name),
            },
            to: vec![EmailAddress {
                email: to,
                name: None,
            }],
            subject,
            html_content: html_body,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        let mut request = self
            .http
            .post(&self.api_url)
            .header("Accept", "application/json")
            .json(&self.body(to, subject, html_body));
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Mail API accepted message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn body_serialises_in_api_shape() {
        let mailer = HttpMailer::new(
            "https://mail.invalid/v3/smtp/email",
            Some("k".into()),
            "no-reply@folio.local",
            "Folio",
        )
        .unwrap();

        let json = serde_json::to_value(mailer.body("a@x.com", "Hi", "<p>x</p>")).unwrap();
        assert_eq!(json["sender"]["email"], "no-reply@folio.local");
        assert_eq!(json["sender"]["name"], "Folio");
        assert_eq!(json["to"][0]["email"], "a@x.com");
        assert!(json["to"][0].get("name").is_none());
        assert_eq!(json["subject"], "Hi");
        assert_eq!(json["htmlContent"], "<p>x</p>");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_error() {
        let mailer = HttpMailer::new("http://127.0.0.1:9/send", None, "a@b.c", "A").unwrap();
        let err = mailer.send("a@x.com", "s", "b").await.unwrap_err();
        assert!(matches!(err, MailError::Request(_)));
    }
}
