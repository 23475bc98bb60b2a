//! Assistant error types

use thiserror::Error;

/// Errors that can occur while handling a conversation turn
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Intent classifier was unreachable or returned an unparseable result
    #[error("Classifier failure: {0}")]
    Classifier(String),

    /// Document retrieval failed
    #[error("Retrieval failure: {0}")]
    Retrieval(String),

    /// Grounded answer generation failed
    #[error("Generation failure: {0}")]
    Generation(String),

    /// Slot search or booking hit a storage problem
    #[error("Slot store failure: {0}")]
    SlotStore(String),

    /// Session not found
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP error talking to a collaborator service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AssistantError {
    /// Create a classifier failure from any displayable cause
    pub fn classifier(msg: impl Into<String>) -> Self {
        AssistantError::Classifier(msg.into())
    }

    /// Create a slot store failure from any displayable cause
    pub fn slot_store(msg: impl Into<String>) -> Self {
        AssistantError::SlotStore(msg.into())
    }
}

/// Result type alias for assistant operations
pub type AssistantResult<T> = Result<T, AssistantError>;
