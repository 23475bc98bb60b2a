//! LLM provider traits
//!
//! Abstracts the model interface so the classifier, responder and
//! scheduling agent can be tested against deterministic fakes. The model is
//! non-deterministic across calls with identical input; callers must
//! re-derive every decision fresh each turn and never cache results.

use anyhow::Result;
use serde_json::Value;

use crate::session::ChatMessage;

use super::types::{LlmDecision, ResponseSchema, ToolDefinition};

/// Trait for chat-completion backends
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Plain text completion over the conversation so far.
    ///
    /// Used for grounded answer generation.
    async fn complete(
        &self,
        system: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<String>;

    /// Completion constrained to a JSON schema.
    ///
    /// Used by the intent classifier. The returned value is the parsed JSON
    /// object; callers validate its fields against their own closed sets.
    async fn complete_structured(
        &self,
        system: &str,
        history: &[ChatMessage],
        user_message: &str,
        schema: &ResponseSchema,
    ) -> Result<Value>;

    /// Single-step action proposal with the given tools available.
    ///
    /// The model may answer in text or propose exactly one tool call; the
    /// caller executes and validates the action locally.
    async fn propose_action(
        &self,
        system: &str,
        history: &[ChatMessage],
        user_message: &str,
        tools: &[ToolDefinition],
    ) -> Result<LlmDecision>;

    /// The model name in use
    fn model(&self) -> String;
}

/// Trait for text embedding backends, consumed by retrieval
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one query string
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
