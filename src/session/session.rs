//! Per-session conversational and business state
//!
//! A `Session` is the unit of conversational continuity: it is created
//! lazily on the first message for an unseen id and destroyed exactly when
//! the conversation ends. `current_role` is written only by the
//! orchestrator (after consulting the intent classifier) and
//! `booking_status` only by the scheduling agent on a successful booking.

use serde::{Deserialize, Serialize};

use crate::catalog::RoleId;

/// Who produced a turn in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One turn of the conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Whether an interview has been booked in this session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    None,
    Confirmed,
}

/// State carried across the turns of one conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique identifier, caller-supplied or server-generated
    pub session_id: String,

    /// Ordered turns; append-only within the session's lifetime
    pub history: Vec<ChatMessage>,

    /// The role under discussion. Written exclusively by the orchestrator.
    pub current_role: Option<RoleId>,

    /// Monotonic: once `Confirmed`, never transitions back
    pub booking_status: BookingStatus,

    /// Non-authoritative hint so the scheduling invitation is not repeated
    pub scheduling_offered: bool,
}

impl Session {
    /// Create a fresh, empty session for the given id
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            history: Vec::new(),
            current_role: None,
            booking_status: BookingStatus::None,
            scheduling_offered: false,
        }
    }

    /// Append a user turn to the history
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.history.push(ChatMessage::user(text));
    }

    /// Append an assistant turn to the history
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.history.push(ChatMessage::assistant(text));
    }

    pub fn is_booked(&self) -> bool {
        self.booking_status == BookingStatus::Confirmed
    }
}
