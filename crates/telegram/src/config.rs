use std::time::Duration;

use {
    printrelay_config::Settings,
    secrecy::{ExposeSecret, Secret},
};

/// Long-polling timeout passed to `getUpdates`, in seconds.
pub const POLL_TIMEOUT_SECS: u32 = 30;

/// Connection settings for the bot.
#[derive(Clone)]
pub struct BotConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,

    pub poll_timeout_secs: u32,

    /// HTTP client timeout; must exceed the polling timeout or the client
    /// aborts requests Telegram is still holding open.
    pub client_timeout: Duration,

    /// Pause after a failed `getUpdates` call.
    pub retry_delay: Duration,
}

impl BotConfig {
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: POLL_TIMEOUT_SECS,
            client_timeout: Duration::from_secs(u64::from(POLL_TIMEOUT_SECS) + 15),
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl From<&Settings> for BotConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            token: settings.telegram_token.clone(),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("client_timeout", &self.client_timeout)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}
