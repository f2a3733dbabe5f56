use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider `{provider}` rejected the credentials")]
    AuthFailed { provider: String },
    #[error("provider `{provider}` is rate limited")]
    RateLimited { provider: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("unreadable provider response: {0}")]
    ResponseParse(String),
    #[error("provider is not configured: {0}")]
    NotConfigured(String),
}

/// An external language-understanding backend. Output is untrusted text and
/// must be validated before use.
#[async_trait]
pub trait LanguageProvider: Send + Sync {
    /// Stable identifier used in logs (usually the model id).
    fn id(&self) -> &str;

    async fn generate(&self, instruction: &str, context: &str) -> Result<String, ProviderError>;
}
