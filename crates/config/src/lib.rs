//! Process configuration for printrelay.
//!
//! Everything is read from environment variables once at startup (the binary
//! seeds the environment from `.env` first) into an immutable [`Settings`]
//! value that is then passed explicitly to the bot and the print pipeline.

pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{ConfigError, Result},
    loader::{from_env, from_lookup},
    schema::{AuthorizationPolicy, Settings},
};
