pub mod core;
pub mod catalog;
pub mod session;
pub mod llm;

// Per-turn conversation handlers
pub mod router;
pub mod retrieval;
pub mod knowledge;
pub mod scheduling;
pub mod ending;

// Turn sequencing
pub mod orchestrator;

// Outer surface
pub mod api;
pub mod config;
pub mod logging;
