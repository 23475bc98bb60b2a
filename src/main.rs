use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use recruit_agent::api::{build_router, AppState};
use recruit_agent::catalog::RoleCatalog;
use recruit_agent::config::Config;
use recruit_agent::knowledge::KnowledgeResponder;
use recruit_agent::llm::OpenAiProvider;
use recruit_agent::logging;
use recruit_agent::orchestrator::Orchestrator;
use recruit_agent::retrieval::VectorRetriever;
use recruit_agent::router::LlmIntentClassifier;
use recruit_agent::scheduling::{PgSlotStore, SchedulingAgent};
use recruit_agent::session::InMemorySessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging()?;

    tracing::info!("=== Recruitment Assistant Starting ===");

    // Missing configuration is the one fatal error class; everything past
    // this point degrades per turn instead of crashing.
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let llm = Arc::new(OpenAiProvider::new(&config.openai_api_key)?);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to slot database");

    let catalog = RoleCatalog::new();
    let retriever = Arc::new(VectorRetriever::new(
        &config.pinecone_index_host,
        &config.pinecone_api_key,
        llm.clone(),
    ));

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(LlmIntentClassifier::new(llm.clone(), &catalog)),
        KnowledgeResponder::new(retriever, llm.clone(), catalog.clone()),
        SchedulingAgent::new(llm, Arc::new(PgSlotStore::new(pool)), catalog.clone()),
        catalog,
    ));

    let state = AppState {
        orchestrator,
        config_presence: config.presence(),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, build_router(state)).await?;

    Ok(())
}
