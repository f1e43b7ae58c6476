use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::{Email, MailError, Mailer};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    /// e.g. `Wedding RSVP <noreply@example.com>`
    pub from: String,
    pub reply_to: Option<String>,
}

/// STARTTLS relay. The HTML body is sent as-is; no provider template.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    reply_to: Option<Mailbox>,
}

fn mailbox(raw: &str) -> Result<Mailbox, MailError> {
    raw.parse().map_err(|_| MailError::Address(raw.to_string()))
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(config.username, config.password);
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .credentials(creds);
        if let Some(port) = config.port {
            builder = builder.port(port);
        }

        Ok(Self {
            transport: builder.build(),
            from: mailbox(&config.from)?,
            reply_to: config.reply_to.as_deref().map(mailbox).transpose()?,
        })
    }

    fn build_message(&self, email: &Email) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(mailbox(&email.to)?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML);
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.clone());
        }
        builder
            .body(email.params.email_body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = self.build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        debug!("SMTP relay accepted message to {}", email.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TemplateParams;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port: Some(2525),
            username: "user".into(),
            password: "pass".into(),
            from: "Wedding RSVP <noreply@example.com>".into(),
            reply_to: None,
        }
    }

    #[tokio::test]
    async fn rejects_bad_sender_address() {
        let mut bad = config();
        bad.from = "not an address".into();
        assert!(matches!(SmtpMailer::new(bad), Err(MailError::Address(_))));
    }

    #[tokio::test]
    async fn builds_html_message() {
        let mailer = SmtpMailer::new(config()).unwrap();
        let email = Email {
            to: "jo@example.com".into(),
            subject: "Hello".into(),
            params: TemplateParams {
                name: "Jo".into(),
                to_email: "jo@example.com".into(),
                email_body: "<p>hi</p>".into(),
                image_url: None,
            },
        };
        let message = mailer.build_message(&email).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Hello"));
        assert!(raw.contains("text/html"));

        let bad = Email {
            to: "nobody".into(),
            ..email
        };
        assert!(matches!(mailer.build_message(&bad), Err(MailError::Address(_))));
    }
}
