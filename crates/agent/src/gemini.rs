//! Gemini `generateContent` REST client, one instance per candidate model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;

use snapbill_core::config::LlmConfig;

use crate::llm::{LanguageProvider, ProviderError};

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|error| ProviderError::Request(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }

    /// One client per configured candidate, in priority order.
    pub fn candidates_from_config(
        config: &LlmConfig,
    ) -> Result<Vec<Arc<dyn LanguageProvider>>, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("llm.api_key is not set".to_string()))?;
        let timeout = Duration::from_secs(config.attempt_timeout_secs);

        config
            .candidate_models
            .iter()
            .map(|model| {
                Self::new(config.base_url.clone(), api_key.clone(), model.clone(), timeout)
                    .map(|client| Arc::new(client) as Arc<dyn LanguageProvider>)
            })
            .collect()
    }

    fn endpoint_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(instruction: &str, context: &str) -> Value {
        json!({
            "system_instruction": { "parts": [{ "text": instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": context }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        })
    }

    fn map_http_error(&self, status: StatusCode, body_text: &str) -> ProviderError {
        match status.as_u16() {
            401 | 403 => ProviderError::AuthFailed { provider: self.model.clone() },
            429 => ProviderError::RateLimited { provider: self.model.clone() },
            _ => ProviderError::Request(format!("HTTP {status} from Gemini API: {body_text}")),
        }
    }

    /// Concatenated text parts of the first candidate.
    fn parse_response(body: &Value) -> Result<String, ProviderError> {
        let candidate = body["candidates"]
            .as_array()
            .and_then(|candidates| candidates.first())
            .ok_or_else(|| ProviderError::ResponseParse("no candidates in response".to_string()))?;
        let parts = candidate["content"]["parts"].as_array().ok_or_else(|| {
            ProviderError::ResponseParse("missing parts in candidate content".to_string())
        })?;

        let text = parts.iter().filter_map(|part| part["text"].as_str()).collect::<String>();
        if text.trim().is_empty() {
            return Err(ProviderError::ResponseParse("candidate contained no text".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl LanguageProvider for GeminiClient {
    fn id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, instruction: &str, context: &str) -> Result<String, ProviderError> {
        debug!(event_name = "voice.provider.request", model = %self.model, "sending generateContent request");

        let response = self
            .client
            .post(self.endpoint_url())
            .query(&[("key", self.api_key.expose_secret())])
            .json(&Self::request_body(instruction, context))
            .send()
            .await
            .map_err(|error| ProviderError::Request(error.without_url().to_string()))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|error| ProviderError::ResponseParse(format!("failed to read body: {error}")))?;

        if !status.is_success() {
            return Err(self.map_http_error(status, &body_text));
        }

        let body = serde_json::from_str::<Value>(&body_text)
            .map_err(|error| ProviderError::ResponseParse(format!("invalid JSON: {error}")))?;
        Self::parse_response(&body)
    }
}
