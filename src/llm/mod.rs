//! LLM provider abstraction and clients

pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiProvider;
pub use provider::{Embedder, LlmProvider};
pub use types::{LlmDecision, ResponseSchema, ToolCall, ToolDefinition};
