use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::{Email, MailError, Mailer, TemplateParams};

const DEFAULT_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[derive(Debug, Clone)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    /// Required by EmailJS for calls that do not come from a browser.
    pub private_key: Option<String>,
    pub endpoint: Option<String>,
}

/// Sends through the EmailJS REST API. The subject and layout live in the
/// provider-side template; we only supply its parameters.
pub struct EmailJsMailer {
    client: reqwest::Client,
    config: EmailJsConfig,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: TemplateParamsWithSubject<'a>,
}

#[derive(Serialize)]
struct TemplateParamsWithSubject<'a> {
    #[serde(flatten)]
    params: &'a TemplateParams,
    subject: &'a str,
}

impl EmailJsMailer {
    pub fn new(config: EmailJsConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> &str {
        self.config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl Mailer for EmailJsMailer {
    fn name(&self) -> &'static str {
        "emailjs"
    }

    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let body = SendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.public_key,
            access_token: self.config.private_key.as_deref(),
            template_params: TemplateParamsWithSubject {
                params: &email.params,
                subject: &email.subject,
            },
        };

        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("EmailJS accepted message to {}", email.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_emailjs_shape() {
        let params = TemplateParams {
            name: "Jo".into(),
            to_email: "jo@example.com".into(),
            email_body: "<p>hi</p>".into(),
            image_url: None,
        };
        let body = SendRequest {
            service_id: "svc",
            template_id: "tpl",
            user_id: "pub",
            access_token: None,
            template_params: TemplateParamsWithSubject {
                params: &params,
                subject: "Hello",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["user_id"], "pub");
        assert!(json.get("accessToken").is_none());
        assert_eq!(json["template_params"]["to_email"], "jo@example.com");
        assert_eq!(json["template_params"]["subject"], "Hello");
        assert!(json["template_params"].get("image_url").is_none());
    }
}
