//! Outbound email for RSVP confirmations, decline acknowledgements and
//! event reminders.
//!
//! Handlers only see the [`Mailer`] trait. The concrete transport is picked
//! at startup from [`MailSettings`]: console logging for development, the
//! EmailJS REST API, or plain SMTP.

pub mod console;
pub mod emailjs;
pub mod smtp;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

pub use console::ConsoleMailer;
pub use emailjs::{EmailJsConfig, EmailJsMailer};
pub use smtp::{SmtpConfig, SmtpMailer};
pub use templates::EventDetails;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address '{0}'")]
    Address(String),

    #[error("could not build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Values substituted into the provider-side template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateParams {
    pub name: String,
    pub to_email: String,
    pub email_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub params: TemplateParams,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Transport name, for logs.
    fn name(&self) -> &'static str;

    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Transport selection, read from `VOWS_MAIL_TRANSPORT` by the server.
#[derive(Debug, Clone)]
pub enum MailSettings {
    Console,
    EmailJs(EmailJsConfig),
    Smtp(SmtpConfig),
}

pub fn build_mailer(settings: MailSettings) -> Result<Arc<dyn Mailer>, MailError> {
    let mailer: Arc<dyn Mailer> = match settings {
        MailSettings::Console => Arc::new(ConsoleMailer),
        MailSettings::EmailJs(config) => Arc::new(EmailJsMailer::new(config)?),
        MailSettings::Smtp(config) => Arc::new(SmtpMailer::new(config)?),
    };
    tracing::info!("Mail transport: {}", mailer.name());
    Ok(mailer)
}
