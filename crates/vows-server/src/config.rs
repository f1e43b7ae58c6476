use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, warn};

use vows_mail::{EmailJsConfig, EventDetails, MailSettings, SmtpConfig};

/// Placeholder secrets that MUST NOT be used outside development.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub admin_password: String,
    pub mail: MailSettings,
    pub event: EventDetails,
    pub acknowledge_declines: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `load` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let jwt_secret = env.get("VOWS_JWT_SECRET").unwrap_or_default();
        let jwt_secret = if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            if cfg!(debug_assertions) {
                warn!("VOWS_JWT_SECRET is unset or a placeholder; using the development secret");
                DEV_JWT_SECRET.to_string()
            } else {
                bail!("VOWS_JWT_SECRET is unset or still a placeholder");
            }
        } else {
            jwt_secret
        };

        let admin_password = env
            .get("VOWS_ADMIN_PASSWORD")
            .filter(|p| !p.is_empty())
            .ok_or_else(|| anyhow!("VOWS_ADMIN_PASSWORD must be set to protect the dashboard"))?;

        let defaults = EventDetails::default();
        let event = EventDetails {
            couple: env.get_or("VOWS_COUPLE", &defaults.couple),
            venue: env.get_or("VOWS_VENUE", &defaults.venue),
            date: env.get_or("VOWS_DATE", &defaults.date),
            time: env.get_or("VOWS_TIME", &defaults.time),
            colors: env.get_or("VOWS_COLORS", &defaults.colors),
            contact_phone: env.get_or("VOWS_CONTACT_PHONE", &defaults.contact_phone),
            invitation_url: env.get("VOWS_INVITATION_URL"),
            image_url: env.get("VOWS_INVITATION_IMAGE_URL"),
        };

        Ok(Self {
            host: env.get_or("VOWS_HOST", "0.0.0.0"),
            port: env.parse_or("VOWS_PORT", "3000")?,
            db_path: env.get_or("VOWS_DB_PATH", "vows.db").into(),
            jwt_secret,
            admin_password,
            mail: mail_settings(&env)?,
            event,
            acknowledge_declines: env.parse_or("VOWS_ACKNOWLEDGE_DECLINES", "false")?,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.get(key).ok_or_else(|| anyhow!("{} must be set", key))
    }

    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.get(key).unwrap_or_else(|| {
            info!("{} not set, using default: {}", key, default);
            default.to_string()
        });
        raw.parse()
            .map_err(|e| anyhow!("Invalid {} value '{}': {}", key, raw, e))
    }
}

fn mail_settings<F>(env: &Env<F>) -> Result<MailSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let transport = env.get_or("VOWS_MAIL_TRANSPORT", "console").to_lowercase();
    let settings = match transport.as_str() {
        "console" => MailSettings::Console,
        "emailjs" => MailSettings::EmailJs(EmailJsConfig {
            service_id: env.require("EMAILJS_SERVICE_ID")?,
            template_id: env.require("EMAILJS_TEMPLATE_ID")?,
            public_key: env.require("EMAILJS_PUBLIC_KEY")?,
            private_key: env.get("EMAILJS_PRIVATE_KEY"),
            endpoint: env.get("EMAILJS_ENDPOINT"),
        }),
        "smtp" => MailSettings::Smtp(SmtpConfig {
            host: env.require("SMTP_HOST")?,
            port: env
                .get("SMTP_PORT")
                .map(|p| p.parse::<u16>())
                .transpose()
                .context("Invalid SMTP_PORT")?,
            username: env.require("SMTP_USERNAME")?,
            password: env.require("SMTP_PASSWORD")?,
            from: env.require("MAIL_FROM")?,
            reply_to: env.get("MAIL_REPLY_TO"),
        }),
        other => bail!("Unknown VOWS_MAIL_TRANSPORT '{}' (expected console, emailjs or smtp)", other),
    };
    Ok(settings)
}
