//! Core of the multilingual crosspost bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the
//! translation backend live behind ports (traits) implemented in adapter
//! crates.

pub mod broadcast;
pub mod config;
pub mod domain;
pub mod entities;
pub mod errors;
pub mod fit;
pub mod guard;
pub mod logging;
pub mod markers;
pub mod messaging;
pub mod model;
pub mod pipeline;
pub mod translation;
pub mod utf16;

pub use errors::{Error, Result};
