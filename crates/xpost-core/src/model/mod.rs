//! Text-completion backend abstraction used by the translator.

pub mod client;
pub mod types;
