//! Interview scheduling

pub mod action;
pub mod agent;
pub mod slots;

pub use action::{BookArgs, SchedulerAction, SearchArgs, TimePreference};
pub use agent::SchedulingAgent;
pub use slots::{InMemorySlotStore, PgSlotStore, Slot, SlotStore};
