//! Telegram Bot API adapter
//!
//! [`BotClient`] implements the delivery primitives of
//! [`herald_delivery::Platform`] on top of the Bot API's JSON-over-HTTPS
//! methods. [`TelegramReporter`] posts progress events to a log chat.

mod client;
mod config;
mod error;
mod reporter;
pub mod types;

pub use client::BotClient;
pub use config::TelegramConfig;
pub use error::TelegramError;
pub use reporter::TelegramReporter;
