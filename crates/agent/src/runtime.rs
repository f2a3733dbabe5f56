use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use snapbill_core::config::LlmConfig;
use snapbill_core::context::ContextBundle;
use snapbill_core::domain::billing::{BillingProjection, BillingUpdate};
use snapbill_core::snapshot::SnapshotItem;

use crate::classifier::{QueryAnswer, QueryClassifier};
use crate::fallback::ProviderChain;
use crate::gemini::GeminiClient;
use crate::inventory::{finalize_draft, validate_inventory_reply, VoiceInventoryDraft};
use crate::llm::LanguageProvider;
use crate::prompt::{
    render_billing_context, render_inventory_context, BILLING_INSTRUCTION, INVENTORY_INSTRUCTION,
};

const INVENTORY_PARSE_FAILED: &str = "no provider produced a usable inventory parse";

/// Entry point for every voice interaction. Holds only immutable handles,
/// so one instance is shared across requests.
#[derive(Clone)]
pub struct AgentRuntime {
    chain: ProviderChain,
    classifier: QueryClassifier,
}

impl AgentRuntime {
    pub fn new(chain: ProviderChain) -> Self {
        Self { chain, classifier: QueryClassifier::new() }
    }

    pub fn with_providers(providers: Vec<Arc<dyn LanguageProvider>>, attempt_timeout: Duration) -> Self {
        Self::new(ProviderChain::new(providers, attempt_timeout))
    }

    /// Builds the Gemini chain. A missing API key is not fatal: the runtime
    /// still answers keyword queries and degrades provider calls.
    pub fn from_config(config: &LlmConfig) -> Self {
        match GeminiClient::candidates_from_config(config) {
            Ok(candidates) => {
                info!(
                    event_name = "voice.runtime.ready",
                    candidates = candidates.len(),
                    "voice runtime configured"
                );
                Self::with_providers(candidates, Duration::from_secs(config.attempt_timeout_secs))
            }
            Err(error) => {
                warn!(
                    event_name = "voice.runtime.degraded",
                    error = %error,
                    "language provider unavailable; voice billing will degrade"
                );
                Self::new(ProviderChain::unavailable())
            }
        }
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    pub async fn process_voice(&self, utterance: &str, context: &ContextBundle) -> BillingUpdate {
        let rendered = render_billing_context(context, utterance);
        let update = self.chain.resolve_billing(BILLING_INSTRUCTION, &rendered).await;
        info!(
            event_name = "voice.process.completed",
            reply_type = update.kind.as_str(),
            items = update.items.len(),
            line_total = update.line_total(),
            degraded = update.is_degraded(),
            "voice utterance processed"
        );
        update
    }

    pub async fn process_billing(&self, utterance: &str, context: &ContextBundle) -> BillingProjection {
        self.process_voice(utterance, context).await.billing_projection()
    }

    /// Keyword fast path; never reaches a provider.
    pub fn process_query(&self, utterance: &str, catalogue: &[SnapshotItem]) -> QueryAnswer {
        self.classifier.classify(utterance, catalogue)
    }

    pub async fn parse_inventory(
        &self,
        raw_text: &str,
        existing_items: &[SnapshotItem],
        existing_categories: &[String],
    ) -> VoiceInventoryDraft {
        let context = render_inventory_context(raw_text, existing_items, existing_categories);
        match self.chain.first_valid(INVENTORY_INSTRUCTION, &context, validate_inventory_reply).await {
            Some(categories) => {
                let draft = finalize_draft(categories, raw_text, existing_items, existing_categories);
                info!(
                    event_name = "inventory.voice_parse.completed",
                    categories = draft.categories.len(),
                    items = draft.item_count(),
                    "voice inventory parsed"
                );
                draft
            }
            None => VoiceInventoryDraft::unavailable(raw_text, INVENTORY_PARSE_FAILED),
        }
    }
}
