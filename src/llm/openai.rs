//! OpenAI-compatible chat completions client
//!
//! Direct HTTP client for an OpenAI-style API, translating between the
//! crate's message types and the chat-completions wire format. Also serves
//! the embeddings endpoint used by retrieval.
//!
//! # Authentication
//!
//! Uses an API key (set via `OPENAI_API_KEY` or passed directly).
//!
//! ```ignore
//! // From environment variable
//! let llm = OpenAiProvider::from_env()?;
//!
//! // With explicit API key
//! let llm = OpenAiProvider::new("sk-...")?;
//! ```

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;

use crate::session::{ChatMessage, Speaker};

use super::provider::{Embedder, LlmProvider};
use super::types::{LlmDecision, ResponseSchema, ToolCall, ToolDefinition};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    function: WireFunctionCall,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// Arguments arrive as a JSON-encoded string, not an object
    arguments: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

// ============================================================================
// Provider
// ============================================================================

/// OpenAI-compatible LLM and embeddings provider
pub struct OpenAiProvider {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    embedding_model: String,
}

impl OpenAiProvider {
    /// Create a provider from the `OPENAI_API_KEY` environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .context("Failed to create OpenAI client. Make sure OPENAI_API_KEY is set")?;
        Self::new(&api_key)
    }

    /// Create a provider with an explicit API key
    pub fn new(api_key: &str) -> Result<Self> {
        tracing::info!("Creating OpenAI provider, model: {}", DEFAULT_MODEL);

        Ok(Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        })
    }

    /// Set the chat model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at a different OpenAI-compatible endpoint
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Build the wire message list from system prompt, history and the new message
    fn build_messages(
        system: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage {
            role: "system",
            content: system.to_string(),
        });
        for msg in history {
            messages.push(WireMessage {
                role: match msg.speaker {
                    Speaker::User => "user",
                    Speaker::Assistant => "assistant",
                },
                content: msg.text.clone(),
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: user_message.to_string(),
        });
        messages
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChoiceMessage> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Calling chat completions API"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .context("Failed to reach chat completions API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Chat completions API returned {status}: {body}"));
        }

        let mut parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completions response")?;

        if parsed.choices.is_empty() {
            return Err(anyhow!("Chat completions response contained no choices"));
        }
        Ok(parsed.choices.remove(0).message)
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        system: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: Self::build_messages(system, history, user_message),
            temperature: 0.0,
            tools: None,
            response_format: None,
        };

        let message = self.send(&request).await?;
        message
            .content
            .ok_or_else(|| anyhow!("Model returned an empty completion"))
    }

    async fn complete_structured(
        &self,
        system: &str,
        history: &[ChatMessage],
        user_message: &str,
        schema: &ResponseSchema,
    ) -> Result<Value> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: Self::build_messages(system, history, user_message),
            temperature: 0.0,
            tools: None,
            response_format: Some(ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: schema.name.clone(),
                    schema: schema.schema.clone(),
                    strict: true,
                },
            }),
        };

        let message = self.send(&request).await?;
        let content = message
            .content
            .ok_or_else(|| anyhow!("Model returned no structured content"))?;

        serde_json::from_str(&content).context("Structured output was not valid JSON")
    }

    async fn propose_action(
        &self,
        system: &str,
        history: &[ChatMessage],
        user_message: &str,
        tools: &[ToolDefinition],
    ) -> Result<LlmDecision> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: Self::build_messages(system, history, user_message),
            temperature: 0.0,
            tools: Some(
                tools
                    .iter()
                    .map(|t| WireTool {
                        tool_type: "function",
                        function: WireFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.parameters.clone(),
                        },
                    })
                    .collect(),
            ),
            response_format: None,
        };

        let message = self.send(&request).await?;

        // Only the first proposed call is consumed; the caller executes it
        // locally and never loops back for more.
        let tool_call = match message.tool_calls.and_then(|mut calls| {
            if calls.is_empty() {
                None
            } else {
                Some(calls.remove(0))
            }
        }) {
            Some(call) => {
                let arguments: Value = serde_json::from_str(&call.function.arguments)
                    .context("Tool call arguments were not valid JSON")?;
                Some(ToolCall {
                    name: call.function.name,
                    arguments,
                })
            }
            None => None,
        };

        Ok(LlmDecision {
            text: message.content,
            tool_call,
        })
    }

    fn model(&self) -> String {
        self.model.clone()
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to reach embeddings API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Embeddings API returned {status}: {body}"));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embeddings response")?;

        if parsed.data.is_empty() {
            return Err(anyhow!("Embeddings response contained no vectors"));
        }
        Ok(parsed.data.remove(0).embedding)
    }
}
