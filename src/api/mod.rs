//! HTTP surface

pub mod routes;

pub use routes::{build_router, AppState, ChatRequest, ChatResponse};
