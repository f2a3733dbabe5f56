//! Voice assistant runtime for SnapBill.
//!
//! Turns a shopkeeper's spoken utterance into a structured billing update:
//! - Answers simple price questions from the inventory (`classifier`)
//! - Builds provider instructions and context (`prompt`)
//! - Walks an ordered list of language providers until one reply passes
//!   structural validation (`fallback`, `validator`)
//! - Parses dictated inventory lists into reviewable drafts (`inventory`)
//!
//! # Safety Principle
//!
//! The provider is strictly a translator. Its output is untrusted: malformed
//! items are dropped, unknown reply types become errors, and when no provider
//! answers the caller gets a fixed degraded reply instead of an error.

pub mod classifier;
pub mod fallback;
pub mod gemini;
pub mod inventory;
pub mod llm;
pub mod prompt;
pub mod runtime;
pub mod validator;

pub use classifier::{AnswerMode, QueryAnswer, QueryClassifier};
pub use fallback::ProviderChain;
pub use gemini::GeminiClient;
pub use inventory::VoiceInventoryDraft;
pub use llm::{LanguageProvider, ProviderError};
pub use runtime::AgentRuntime;
