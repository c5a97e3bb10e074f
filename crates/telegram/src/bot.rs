use std::sync::Arc;

use {
    printrelay_print::PrintOrchestrator,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio::task::JoinHandle,
    tokio_util::{sync::CancellationToken, task::TaskTracker},
    tracing::{debug, error, info, warn},
};

use crate::{config::BotConfig, handlers, state::RelayContext};

/// A running polling loop and the update tasks it spawned.
pub struct Polling {
    cancel: CancellationToken,
    tracker: TaskTracker,
    task: JoinHandle<()>,
}

impl Polling {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolves when polling ends, on request or on its own.
    pub async fn stopped(&self) {
        self.cancel.cancelled().await;
    }

    /// Stop polling, then wait for every update already being handled.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "polling task ended abnormally");
        }
        self.tracker.close();
        if !self.tracker.is_empty() {
            info!(in_flight = self.tracker.len(), "waiting for in-flight updates");
        }
        self.tracker.wait().await;
        debug!("all update tasks finished");
    }
}

/// Connect the bot and start polling for updates.
///
/// Spawns a background task that handles updates, each on its own tracked
/// task, until [`Polling::shutdown`] is called.
pub async fn start_polling(
    config: BotConfig,
    orchestrator: Arc<PrintOrchestrator>,
) -> anyhow::Result<Polling> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(config.client_timeout)
        .build()?;
    let bot = Bot::with_client(config.token(), client);

    // Verify credentials and get bot username.
    let me = bot.get_me().await?;

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    let commands = vec![
        BotCommand::new("start", "Show how to print"),
        BotCommand::new("status", "Show the printer queue"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?me.username, "telegram bot connected (webhook cleared)");

    let cancel = CancellationToken::new();
    let tracker = TaskTracker::new();
    let ctx = RelayContext::new(bot, orchestrator);
    let task = tokio::spawn(poll_loop(ctx, config, cancel.clone(), tracker.clone()));
    Ok(Polling {
        cancel,
        tracker,
        task,
    })
}

async fn poll_loop(
    ctx: RelayContext,
    config: BotConfig,
    cancel: CancellationToken,
    tracker: TaskTracker,
) {
    info!("starting telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let request = ctx
            .bot
            .get_updates()
            .offset(offset)
            .timeout(config.poll_timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]);

        let result = tokio::select! {
            () = cancel.cancelled() => {
                info!("telegram polling stopped");
                break;
            },
            result = request.send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    dispatch(update.kind, &ctx, &tracker);
                }
            },
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                error!("another instance is already polling with this token, stopping");
                cancel.cancel();
                break;
            },
            Err(e) => {
                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(config.retry_delay) => {},
                }
            },
        }
    }
}

fn dispatch(kind: UpdateKind, ctx: &RelayContext, tracker: &TaskTracker) {
    match kind {
        UpdateKind::Message(msg) => {
            debug!(chat_id = msg.chat.id.0, "received telegram message");
            let ctx = ctx.clone();
            tracker.spawn(async move {
                if let Err(e) = handlers::handle_message(msg, &ctx).await {
                    error!(error = %e, "error handling telegram message");
                }
            });
        },
        UpdateKind::CallbackQuery(query) => {
            debug!(callback_data = ?query.data, "received telegram callback query");
            let ctx = ctx.clone();
            tracker.spawn(async move {
                if let Err(e) = handlers::handle_callback_query(query, &ctx).await {
                    error!(error = %e, "error handling telegram callback query");
                }
            });
        },
        other => debug!("ignoring non-message update: {other:?}"),
    }
}
