//! Channel publishing abstractions (Telegram today).

pub mod port;
pub mod throttled;
pub mod types;
