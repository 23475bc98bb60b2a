//! Document retrieval
//!
//! Vector-similarity search over ingested job descriptions, filtered by
//! role. The index is an external collaborator; this module embeds the
//! query and issues a metadata-filtered top-k search against it.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::RoleId;
use crate::core::{AssistantError, AssistantResult};
use crate::llm::Embedder;

/// Default number of passages fetched per query
pub const DEFAULT_TOP_K: usize = 5;

/// A scored passage of grounding text
#[derive(Debug, Clone)]
pub struct Passage {
    pub text: String,
    pub score: f32,
}

/// Trait for role-filtered similarity search backends
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fetch the `top_k` passages most relevant to `query`, restricted to
    /// documents ingested for `role`.
    async fn retrieve(
        &self,
        query: &str,
        role: RoleId,
        top_k: usize,
    ) -> AssistantResult<Vec<Passage>>;
}

// ============================================================================
// Pinecone-style index client
// ============================================================================

#[derive(Debug, Serialize)]
struct QueryRequest {
    vector: Vec<f32>,
    #[serde(rename = "topK")]
    top_k: usize,
    filter: serde_json::Value,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Debug, Deserialize)]
struct MatchMetadata {
    #[serde(default)]
    text: String,
}

/// Retriever backed by a Pinecone-compatible vector index
pub struct VectorRetriever {
    client: Client,
    index_host: String,
    api_key: String,
    embedder: Arc<dyn Embedder>,
}

impl VectorRetriever {
    pub fn new(
        index_host: impl Into<String>,
        api_key: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            client: Client::new(),
            index_host: index_host.into(),
            api_key: api_key.into(),
            embedder,
        }
    }

    async fn query_index(
        &self,
        vector: Vec<f32>,
        role: RoleId,
        top_k: usize,
    ) -> anyhow::Result<Vec<Passage>> {
        let request = QueryRequest {
            vector,
            top_k,
            filter: json!({ "role_id": role.as_str() }),
            include_metadata: true,
        };

        let response = self
            .client
            .post(format!("{}/query", self.index_host))
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to reach vector index")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Vector index returned {status}: {body}"));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .context("Failed to parse vector index response")?;

        Ok(parsed
            .matches
            .into_iter()
            .filter_map(|m| {
                m.metadata.map(|meta| Passage {
                    text: meta.text,
                    score: m.score,
                })
            })
            .collect())
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(
        &self,
        query: &str,
        role: RoleId,
        top_k: usize,
    ) -> AssistantResult<Vec<Passage>> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| AssistantError::Retrieval(e.to_string()))?;

        let passages = self
            .query_index(vector, role, top_k)
            .await
            .map_err(|e| AssistantError::Retrieval(e.to_string()))?;

        tracing::debug!(
            role = %role,
            passages = passages.len(),
            "Retrieved grounding passages"
        );
        Ok(passages)
    }
}

/// Join passages into one grounding context block
pub fn join_context(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}
