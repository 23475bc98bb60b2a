//! REST API routes
//!
//! Endpoints:
//! - POST /chat    - Handle one conversation turn
//! - GET  /        - Status/version blob
//! - GET  /health  - Configuration presence report
//!
//! A thin wrapper: all conversation logic lives in the orchestrator, and
//! the chat handler never fails the request — orchestration problems come
//! back as a degraded bot response.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ConfigPresence;
use crate::orchestrator::Orchestrator;

/// Shared state for all routes
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub config_presence: ConfigPresence,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub user_message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub bot_response: String,
    pub logs: Vec<String>,
    pub new_session_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    environment_variables: ConfigPresence,
    version: &'static str,
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(chat))
        .route("/", get(root))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "API is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let presence = state.config_presence;
    Json(HealthResponse {
        status: if presence.all_present() {
            "healthy"
        } else {
            "unhealthy"
        },
        environment_variables: presence,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Json<ChatResponse> {
    tracing::info!(session_id = %request.session_id, "Chat endpoint called");

    let outcome = state
        .orchestrator
        .handle_turn(&request.session_id, &request.user_message)
        .await;

    Json(ChatResponse {
        bot_response: outcome.bot_response,
        logs: outcome.logs,
        new_session_required: outcome.new_session_required,
        new_session_id: outcome.new_session_id,
        welcome_message: outcome.welcome_message,
    })
}
