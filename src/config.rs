//! Process configuration
//!
//! All environment access happens here. A missing required variable is a
//! fatal startup error; per-turn code never reads the environment.

use std::env;

use crate::core::{AssistantError, AssistantResult};

/// Default bind address for the HTTP server
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Runtime configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the LLM / embeddings service
    pub openai_api_key: String,

    /// Postgres connection string for the interview slot store
    pub database_url: String,

    /// API key for the vector search service
    pub pinecone_api_key: String,

    /// Base URL of the vector index (the per-index query host)
    pub pinecone_index_host: String,

    /// Address the HTTP server binds to
    pub bind_addr: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Collects every missing required variable so the startup error names
    /// all of them at once instead of failing one at a time.
    pub fn from_env() -> AssistantResult<Self> {
        let mut missing = Vec::new();

        let openai_api_key = require("OPENAI_API_KEY", &mut missing);
        let database_url = require("DATABASE_URL", &mut missing);
        let pinecone_api_key = require("PINECONE_API_KEY", &mut missing);
        let pinecone_index_host = require("PINECONE_INDEX_HOST", &mut missing);

        if !missing.is_empty() {
            return Err(AssistantError::InvalidConfig(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let bind_addr =
            env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            openai_api_key,
            database_url,
            pinecone_api_key,
            pinecone_index_host,
            bind_addr,
        })
    }

    /// Presence flags for the health endpoint (never the values themselves)
    pub fn presence(&self) -> ConfigPresence {
        ConfigPresence {
            openai_api_key: !self.openai_api_key.is_empty(),
            database_url: !self.database_url.is_empty(),
            pinecone_api_key: !self.pinecone_api_key.is_empty(),
            pinecone_index_host: !self.pinecone_index_host.is_empty(),
        }
    }
}

/// Which required settings are present, for health reporting
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ConfigPresence {
    pub openai_api_key: bool,
    pub database_url: bool,
    pub pinecone_api_key: bool,
    pub pinecone_index_host: bool,
}

impl ConfigPresence {
    pub fn all_present(&self) -> bool {
        self.openai_api_key
            && self.database_url
            && self.pinecone_api_key
            && self.pinecone_index_host
    }
}

fn require(name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}
