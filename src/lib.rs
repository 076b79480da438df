//! Tikitly support chat: conversation store, answer ingestion, and a terminal front end.

pub mod client;
pub mod config;
pub mod conversation;
pub mod driver;
pub mod events;
pub mod logging;
pub mod prompts;
pub mod streaming;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{SupportBackend, SupportClient, TransportError};
pub use config::Config;
pub use conversation::{Conversation, Message, MessageUpdate, StateError};
pub use driver::{IgnoreReason, SubmitOutcome, SupportDriver};
pub use events::{ChatEvent, ResponseMode, Role};
