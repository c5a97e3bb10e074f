//! Telegram transport for the print relay.
//!
//! Receives documents, photos, commands and confirmation button presses via
//! long polling with teloxide, downloads offered files, and renders notices
//! back to the chat.

pub mod bot;
pub mod config;
pub mod download;
pub mod error;
pub mod handlers;
pub mod keyboard;
pub mod outbound;
pub mod state;
pub mod text;

pub use {
    bot::{Polling, start_polling},
    config::BotConfig,
    download::TelegramFileSource,
    error::{Error, Result},
    outbound::TelegramNotifier,
    state::RelayContext,
};
