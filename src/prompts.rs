use crate::events::ResponseMode;

/// Questions offered before the user has typed anything
pub const QUICK_ACTIONS: [&str; 6] = [
    "How do I create a new event?",
    "How do I add and configure ticket types?",
    "What are add-ons and how do I create them?",
    "Explain the different commission models",
    "How can I issue complimentary tickets?",
    "How do I check my event metrics?",
];

pub const PANEL_TITLE: &str = "Tikitly Support";
pub const PANEL_SUBTITLE: &str = "Get help with events, tickets, and features";

/// Apology shown in place of the answer when a single-shot request fails
pub const SINGLE_SHOT_ERROR: &str =
    "Sorry, I encountered an error connecting to the support system. Please contact Tikitly Support.";

/// Apology shown in place of the answer when a streamed request fails
pub const STREAM_ERROR: &str = "Sorry, I encountered an error connecting to Tikitly Support.";

pub fn fallback_message(mode: ResponseMode) -> &'static str {
    match mode {
        ResponseMode::Single => SINGLE_SHOT_ERROR,
        ResponseMode::Stream => STREAM_ERROR,
    }
}

pub fn default_quick_actions() -> Vec<String> {
    QUICK_ACTIONS.iter().map(|q| q.to_string()).collect()
}
