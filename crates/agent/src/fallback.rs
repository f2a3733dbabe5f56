//! Ordered provider fallback.
//!
//! Candidates are tried one at a time in priority order. Each attempt is
//! bounded by its own timeout, and the first reply that passes structural
//! validation ends the walk. Exhaustion is reported as `None`; callers pick
//! their own degraded reply, so nothing escapes as an error.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use snapbill_core::domain::billing::BillingUpdate;

use crate::llm::LanguageProvider;
use crate::validator::{validate_billing_reply, Verdict};

pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone)]
pub struct ProviderChain {
    candidates: Vec<Arc<dyn LanguageProvider>>,
    attempt_timeout: Duration,
}

impl ProviderChain {
    pub fn new(candidates: Vec<Arc<dyn LanguageProvider>>, attempt_timeout: Duration) -> Self {
        Self { candidates, attempt_timeout }
    }

    /// A chain with no candidates; every call degrades immediately.
    pub fn unavailable() -> Self {
        Self::new(Vec::new(), DEFAULT_ATTEMPT_TIMEOUT)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidate_ids(&self) -> Vec<String> {
        self.candidates.iter().map(|candidate| candidate.id().to_string()).collect()
    }

    pub async fn first_valid<T, F>(&self, instruction: &str, context: &str, validate: F) -> Option<T>
    where
        F: Fn(&str) -> Verdict<T>,
    {
        for (attempt, candidate) in self.candidates.iter().enumerate() {
            let outcome =
                tokio::time::timeout(self.attempt_timeout, candidate.generate(instruction, context))
                    .await;

            let reason = match outcome {
                Err(_) => format!("timed out after {}s", self.attempt_timeout.as_secs_f32()),
                Ok(Err(provider_error)) => provider_error.to_string(),
                Ok(Ok(raw)) => match validate(&raw) {
                    Verdict::Valid(value) => {
                        info!(
                            event_name = "voice.provider.resolved",
                            provider = candidate.id(),
                            attempt = attempt + 1,
                            "provider reply accepted"
                        );
                        return Some(value);
                    }
                    Verdict::Invalid(reason) => format!("invalid reply: {reason}"),
                },
            };

            warn!(
                event_name = "voice.provider.attempt_failed",
                provider = candidate.id(),
                attempt = attempt + 1,
                reason = %reason,
                "provider attempt failed; trying next candidate"
            );
        }

        error!(
            event_name = "voice.provider.exhausted",
            candidates = self.candidates.len(),
            "all provider candidates failed"
        );
        None
    }

    pub async fn resolve_billing(&self, instruction: &str, context: &str) -> BillingUpdate {
        self.first_valid(instruction, context, validate_billing_reply)
            .await
            .unwrap_or_else(BillingUpdate::degraded)
    }
}
