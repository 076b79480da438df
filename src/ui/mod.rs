//! Terminal front end for the support widget

pub mod app;
pub mod conversation;
pub mod terminal;

pub use app::run;
