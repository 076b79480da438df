//! Support panel components

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;
pub mod markdown;
pub mod status;

pub use commands::{get_help_text, ParsedCommand, SlashCommand};
pub use composer::{ComposerResult, ConversationComposer};
pub use history::ConversationHistory;
pub use manager::{PanelAction, SupportPanel};
pub use status::StatusBar;
