use thiserror::Error;

/// Fatal configuration problems; the process exits before serving anything.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no {name} value in the environment")]
    MissingVar { name: &'static str },

    #[error("incorrect Telegram user ID(s): {}", ids.join(", "))]
    InvalidUserIds { ids: Vec<String> },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
