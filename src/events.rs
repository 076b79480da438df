use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::conversation::Message;

/// Notifications emitted by the driver whenever the conversation changes
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A message was pushed onto the end of the conversation
    MessageAppended { index: usize, message: Message },

    /// The last (pending) message changed
    MessageUpdated { index: usize, message: Message },

    /// The conversation was emptied
    Cleared,

    /// The request flag flipped
    BusyChanged(bool),
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Tikitly Support",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Role::User => "👤",
            Role::Assistant => "🤖",
        }
    }
}

/// How the answer is fetched from the backend
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
    Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResponseMode {
    /// One JSON request, one JSON answer
    Single,
    /// Answer text arrives as a chunked byte stream
    #[default]
    Stream,
}
