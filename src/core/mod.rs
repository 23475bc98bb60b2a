//! Core types shared across the assistant

pub mod error;

pub use error::{AssistantError, AssistantResult};
