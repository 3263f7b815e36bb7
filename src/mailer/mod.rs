use std::env;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct MailerConfig {
    pub relay_url: String,
    pub api_token: String,
    pub from_address: String,
}

impl MailerConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let relay_url = env::var("MAIL_RELAY_URL")
            .map_err(|_| AppError::Mail("MAIL_RELAY_URL is not set".to_string()))?;
        let api_token = env::var("MAIL_API_TOKEN")
            .map_err(|_| AppError::Mail("MAIL_API_TOKEN is not set".to_string()))?;
        let from_address = env::var("MAIL_FROM")
            .map_err(|_| AppError::Mail("MAIL_FROM is not set".to_string()))?;

        Ok(Self {
            relay_url,
            api_token,
            from_address,
        })
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_code(&self, to: &str, code: &str) -> Result<(), AppError>;
}

/// Delivers mail through an HTTP relay service.
pub struct HttpMailer {
    client: Client,
    config: MailerConfig,
}

impl HttpMailer {
    pub fn new(config: MailerConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Mail(format!("Failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_reset_code(&self, to: &str, code: &str) -> Result<(), AppError> {
        let body = serde_json::json!({
            "from": self.config.from_address,
            "to": to,
            "subject": "Account Password Reset Code",
            "text": format!("Your password reset code is: {code}"),
        });

        let response = self
            .client
            .post(&self.config.relay_url)
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Mail(format!("mail relay request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Mail(format!("mail relay error {status}: {text}")));
        }

        Ok(())
    }
}

/// Stands in when no relay is configured; used in tests and offline runs.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_reset_code(&self, to: &str, _code: &str) -> Result<(), AppError> {
        info!("mail delivery disabled, skipping reset code for {to}");
        Ok(())
    }
}
