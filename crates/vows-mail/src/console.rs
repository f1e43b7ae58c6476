use async_trait::async_trait;
use tracing::info;

use crate::{Email, MailError, Mailer};

/// Development transport: writes the message to the log instead of sending it.
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn send(&self, email: &Email) -> Result<(), MailError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            "--- Sending email ---\n{}",
            email.params.email_body
        );
        Ok(())
    }
}
