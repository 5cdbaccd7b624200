//! HTML bodies for the two notices the auth flows send.

use crate::auth::otp::OTP_TTL_SECS;

/// A rendered message.
#[derive(Debug, Clone)]
pub struct Mail {
    pub subject: String,
    pub html: String,
}

/// Why an OTP is being sent; only changes the wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    Registration,
    PasswordReset,
}

pub fn otp_notice(purpose: OtpPurpose, code: &str) -> Mail {
    let (subject, action) = match purpose {
        OtpPurpose::Registration => ("Verify your email address", "finish creating your account"),
        OtpPurpose::PasswordReset => ("Reset your password", "reset your password"),
    };
    let minutes = OTP_TTL_SECS / 60;

    Mail {
        subject: subject.to_string(),
        html: format!(
            "<p>Use the code below to {action}.</p>\
             <p style=\"font-size:24px;letter-spacing:4px\"><strong>{code}</strong></p>\
             <p>The code expires in {minutes} minutes. If you did not ask for it, \
             you can ignore this email.</p>"
        ),
    }
}

pub fn welcome_notice(full_name: &str) -> Mail {
    Mail {
        subject: "Welcome to Folio".to_string(),
        html: format!(
            "<p>Hi {},</p><p>Your account is ready. Welcome aboard!</p>",
            escape_html(full_name)
        ),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_notice_contains_code_and_lifetime() {
        let mail = otp_notice(OtpPurpose::Registration, "123456");
        assert!(mail.html.contains("123456"));
        assert!(mail.html.contains("10 minutes"));

        let reset = otp_notice(OtpPurpose::PasswordReset, "654321");
        assert_ne!(mail.subject, reset.subject);
    }

    #[test]
    fn welcome_notice_escapes_name() {
        let mail = welcome_notice("<b>Eve</b> & co");
        assert!(mail.html.contains("&lt;b&gt;Eve&lt;/b&gt; &amp; co"));
        assert!(!mail.html.contains("<b>Eve"));
    }
}
