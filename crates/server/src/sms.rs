//! Outbound SMS delivery for bill receipts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use snapbill_core::config::SmsConfig;
use thiserror::Error;
use tracing::{info, warn};

pub const MOCK_MESSAGE_ID: &str = "MOCK_MSG_12345";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SmsDelivery {
    pub message_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SmsError {
    #[error("sms gateway rejected the message: {0}")]
    Rejected(String),
    #[error("sms gateway request failed: {0}")]
    Transport(String),
    #[error("sms gateway returned an empty response")]
    EmptyResponse,
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, recipient: &str, text: &str) -> Result<SmsDelivery, SmsError>;
}

/// Fast2SMS "quick" transactional route.
pub struct Fast2SmsGateway {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl Fast2SmsGateway {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Result<Self, SmsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|error| SmsError::Transport(error.to_string()))?;
        Ok(Self { client, base_url: base_url.into(), api_key })
    }
}

#[async_trait]
impl SmsGateway for Fast2SmsGateway {
    fn name(&self) -> &'static str {
        "fast2sms"
    }

    async fn send(&self, recipient: &str, text: &str) -> Result<SmsDelivery, SmsError> {
        let response = self
            .client
            .get(&self.base_url)
            .header("authorization", self.api_key.expose_secret())
            .query(&[
                ("route", "q"),
                ("message", text),
                ("language", "english"),
                ("flash", "0"),
                ("numbers", recipient),
            ])
            .send()
            .await
            .map_err(|error| SmsError::Transport(error.without_url().to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|error| SmsError::Transport(error.to_string()))?;
        info!(
            event_name = "sms.gateway.response",
            gateway = self.name(),
            status = status.as_u16(),
            "sms gateway responded"
        );
        parse_fast2sms_response(&body)
    }
}

pub fn parse_fast2sms_response(body: &str) -> Result<SmsDelivery, SmsError> {
    if body.trim().is_empty() {
        return Err(SmsError::EmptyResponse);
    }
    let payload = serde_json::from_str::<Value>(body)
        .map_err(|error| SmsError::Transport(format!("unreadable gateway response: {error}")))?;

    if payload["return"].as_bool() == Some(true) {
        let message_id = payload["request_id"].as_str().unwrap_or_default().to_string();
        return Ok(SmsDelivery { message_id });
    }

    let reason = match &payload["message"] {
        Value::String(message) => message.clone(),
        Value::Array(messages) => {
            messages.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("; ")
        }
        _ => "unknown gateway error".to_string(),
    };
    Err(SmsError::Rejected(reason))
}

/// Logs the message instead of sending it.
#[derive(Clone, Debug, Default)]
pub struct MockSmsGateway;

#[async_trait]
impl SmsGateway for MockSmsGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, recipient: &str, text: &str) -> Result<SmsDelivery, SmsError> {
        info!(
            event_name = "sms.gateway.mocked",
            recipient = %recipient,
            characters = text.chars().count(),
            "sms gateway not configured; message logged only"
        );
        Ok(SmsDelivery { message_id: MOCK_MESSAGE_ID.to_string() })
    }
}

pub fn gateway_from_config(config: &SmsConfig) -> Arc<dyn SmsGateway> {
    let api_key = config.api_key.clone().filter(|key| !key.expose_secret().trim().is_empty());
    match (config.enabled, api_key) {
        (true, Some(api_key)) => match Fast2SmsGateway::new(config.base_url.clone(), api_key) {
            Ok(gateway) => Arc::new(gateway),
            Err(error) => {
                warn!(event_name = "sms.gateway.degraded", error = %error, "falling back to mock sms gateway");
                Arc::new(MockSmsGateway)
            }
        },
        _ => Arc::new(MockSmsGateway),
    }
}

/// Accepts Indian mobile numbers with an optional `+91`/`91`/`0` prefix and
/// separators; returns the bare 10 digits.
pub fn normalize_mobile(raw: &str) -> Option<String> {
    let digits = raw
        .chars()
        .filter(|character| !matches!(character, ' ' | '-' | '(' | ')'))
        .collect::<String>();
    let digits = digits.strip_prefix("+91").unwrap_or(&digits);
    let digits = match digits.len() {
        12 => digits.strip_prefix("91").unwrap_or(digits),
        11 => digits.strip_prefix('0').unwrap_or(digits),
        _ => digits,
    };
    (digits.len() == 10 && digits.chars().all(|character| character.is_ascii_digit()))
        .then(|| digits.to_string())
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use snapbill_core::config::AppConfig;

    use super::{
        gateway_from_config, normalize_mobile, parse_fast2sms_response, MockSmsGateway, SmsError,
        SmsGateway, MOCK_MESSAGE_ID,
    };

    #[test]
    fn mobile_numbers_are_reduced_to_ten_digits() {
        assert_eq!(normalize_mobile("+91 98765 43210").as_deref(), Some("9876543210"));
        assert_eq!(normalize_mobile("919876543210").as_deref(), Some("9876543210"));
        assert_eq!(normalize_mobile("09876543210").as_deref(), Some("9876543210"));
        assert_eq!(normalize_mobile("98765-43210").as_deref(), Some("9876543210"));
        assert_eq!(normalize_mobile("12345"), None);
        assert_eq!(normalize_mobile("98765abcde"), None);
    }

    #[test]
    fn gateway_responses_are_classified() {
        assert_eq!(
            parse_fast2sms_response(r#"{"return":true,"request_id":"req-42","message":["SMS sent"]}"#)
                .expect("delivered")
                .message_id,
            "req-42"
        );
        assert_eq!(
            parse_fast2sms_response(r#"{"return":false,"message":"Invalid Authentication"}"#),
            Err(SmsError::Rejected("Invalid Authentication".to_string()))
        );
        assert_eq!(parse_fast2sms_response("  "), Err(SmsError::EmptyResponse));
        assert!(matches!(parse_fast2sms_response("<html>"), Err(SmsError::Transport(_))));
    }

    #[test]
    fn unconfigured_sms_uses_the_mock_gateway() {
        let mut config = AppConfig::default().sms;
        assert_eq!(gateway_from_config(&config).name(), "mock");

        config.api_key = Some(SecretString::from("key".to_string()));
        assert_eq!(gateway_from_config(&config).name(), "mock");

        config.enabled = true;
        assert_eq!(gateway_from_config(&config).name(), "fast2sms");
    }

    #[tokio::test]
    async fn mock_gateway_returns_fixed_message_id() {
        let delivery = MockSmsGateway.send("9876543210", "receipt").await.expect("mock send");
        assert_eq!(delivery.message_id, MOCK_MESSAGE_ID);
    }
}
