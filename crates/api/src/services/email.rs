//! Outgoing e-mail.
//!
//! Providers:
//! - `console`: logs the message (development)
//! - `resend`: Resend HTTP API

use crate::config::EmailConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("enabled", &self.config.enabled)
            .field("provider", &self.config.provider)
            .finish()
    }
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmailError::SendFailed(format!("HTTP client: {}", e)))?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Sends one message. A disabled service logs and succeeds.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !message.to.contains('@') {
            return Err(EmailError::InvalidAddress(message.to));
        }

        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message),
            "resend" => self.send_resend(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        info!(body_text = %message.body_text, "Email body");
        if let Some(html) = &message.body_html {
            debug!(body_html_length = html.len(), "Email HTML body");
        }
        Ok(())
    }

    async fn send_resend(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.resend_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let payload = ResendPayload {
            from: format!("{} <{}>", self.config.sender_name, self.config.sender_email),
            to: [&message.to],
            subject: &message.subject,
            text: &message.body_text,
            html: message.body_html.as_deref(),
        };

        let response = self
            .client
            .post(&self.config.resend_api_url)
            .bearer_auth(&self.config.resend_api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("Resend request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via Resend");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "Resend API error");
            Err(EmailError::ProviderError(format!(
                "Resend returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool, provider: &str) -> EmailConfig {
        EmailConfig {
            enabled,
            provider: provider.to_string(),
            ..EmailConfig::default()
        }
    }

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: "تنبيه".to_string(),
            body_text: "نص".to_string(),
            body_html: Some("<p>نص</p>".to_string()),
        }
    }

    #[tokio::test]
    async fn test_console_provider_succeeds() {
        let service = EmailService::new(config(true, "console")).unwrap();
        assert!(service.send(message("admin@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_skips_send() {
        let service = EmailService::new(config(false, "resend")).unwrap();
        assert!(!service.is_enabled());
        assert!(service.send(message("admin@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_resend_without_key_is_not_configured() {
        let service = EmailService::new(config(true, "resend")).unwrap();
        let err = service.send(message("admin@example.com")).await.unwrap_err();
        assert!(matches!(err, EmailError::NotConfigured));
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let service = EmailService::new(config(true, "carrier-pigeon")).unwrap();
        assert!(service.send(message("admin@example.com")).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let service = EmailService::new(config(true, "console")).unwrap();
        let err = service.send(message("nobody")).await.unwrap_err();
        assert!(matches!(err, EmailError::InvalidAddress(_)));
    }

    #[test]
    fn test_resend_payload_shape() {
        let payload = ResendPayload {
            from: "Alerts <a@example.com>".to_string(),
            to: ["b@example.com"],
            subject: "s",
            text: "t",
            html: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["to"][0], "b@example.com");
        assert!(json.get("html").is_none());
    }
}
