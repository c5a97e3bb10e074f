use std::{future::Future, time::Duration};

use {
    anyhow::Result,
    async_trait::async_trait,
    printrelay_print::{Notice, Notifier},
    teloxide::{
        RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{ChatId, ReplyMarkup},
    },
    tracing::{debug, warn},
};

use crate::{
    keyboard::{confirmation_keyboard, reply_keyboard},
    text::{TELEGRAM_MAX_MESSAGE_LEN, chunk_message},
};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Sends notices to one chat as plain text, split into as many messages as
/// the length limit requires.
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }
}

/// Confirmation requests carry the Print/Cancel buttons; everything else
/// keeps the command keyboard visible.
pub fn markup_for(notice: &Notice) -> ReplyMarkup {
    match notice.pending_job() {
        Some(job_id) => confirmation_keyboard(job_id).into(),
        None => reply_keyboard().into(),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, notice: Notice) -> Result<()> {
        let chunks = chunk_message(&notice.text(), TELEGRAM_MAX_MESSAGE_LEN);
        let markup = markup_for(&notice);
        let chat_id = self.chat_id;
        let last = chunks.len().saturating_sub(1);
        for (index, chunk) in chunks.iter().enumerate() {
            // Buttons go under the final part only.
            run_telegram_request_with_retry(chat_id, "send notice", || {
                let mut req = self.bot.send_message(chat_id, chunk);
                if index == last {
                    req = req.reply_markup(markup.clone());
                }
                async move { req.await }
            })
            .await?;
        }
        debug!(chat_id = chat_id.0, parts = chunks.len(), ?notice, "notice sent");
        Ok(())
    }
}

async fn run_telegram_request_with_retry<T, F, Fut>(
    chat_id: ChatId,
    operation: &'static str,
    mut request: F,
) -> std::result::Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RequestError>>,
{
    let mut retries = 0usize;

    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let Some(wait) = retry_after_duration(&err) else {
                    return Err(err);
                };

                if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                    warn!(
                        chat_id = chat_id.0,
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limit persisted after retries"
                    );
                    return Err(err);
                }

                retries += 1;
                warn!(
                    chat_id = chat_id.0,
                    operation,
                    retries,
                    max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                    retry_after_secs = wait.as_secs(),
                    "telegram rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
            },
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}
