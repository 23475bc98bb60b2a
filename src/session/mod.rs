//! Conversational session state

pub mod session;
pub mod store;

pub use session::{BookingStatus, ChatMessage, Session, Speaker};
pub use store::{InMemorySessionStore, SessionStore};
