use std::sync::Arc;

use {
    printrelay_common::types::Principal,
    printrelay_print::InboundFile,
    teloxide::{
        prelude::*,
        types::{CallbackQuery, MediaKind, MessageKind},
    },
    tracing::{debug, info},
};

use crate::{keyboard::parse_callback_data, outbound::TelegramNotifier, state::RelayContext};

/// What an inbound message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Start,
    Status,
    File(InboundFile),
    /// Anything the relay cannot act on.
    Other,
}

/// Handle a single inbound Telegram message (called from the polling loop).
pub async fn handle_message(msg: Message, ctx: &RelayContext) -> anyhow::Result<()> {
    let Some(principal) = principal_of(&msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without sender");
        return Ok(());
    };

    let notifier = Arc::new(TelegramNotifier::new(ctx.bot.clone(), msg.chat.id));
    let inbound = parse_message(&msg);
    debug!(chat_id = msg.chat.id.0, %principal, ?inbound, "handling telegram message");

    match inbound {
        Inbound::Start => ctx.orchestrator.greet(principal, notifier.as_ref()).await,
        Inbound::Status => {
            ctx.orchestrator
                .queue_status(principal, notifier.as_ref())
                .await;
        },
        Inbound::File(file) => {
            let outcome = ctx
                .orchestrator
                .handle_file(principal, file, ctx.files.as_ref(), notifier)
                .await;
            debug!(%principal, ?outcome, "file handled");
        },
        Inbound::Other => {
            ctx.orchestrator
                .reject_unsupported_message(principal, notifier.as_ref())
                .await;
        },
    }
    Ok(())
}

/// Handle a press on a Print/Cancel button.
pub async fn handle_callback_query(query: CallbackQuery, ctx: &RelayContext) -> anyhow::Result<()> {
    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };

    // Answer the callback to dismiss the loading spinner.
    if let Err(e) = ctx.bot.answer_callback_query(&query.id).await {
        debug!(error = %e, "failed to answer callback query");
    }

    let Some((decision, job_id)) = parse_callback_data(data) else {
        debug!(data, "ignoring unknown callback payload");
        return Ok(());
    };

    let principal = Principal(query.from.id.0);
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or_else(|| query.from.id.into());
    info!(%principal, %job_id, ?decision, "confirmation button pressed");

    let notifier = TelegramNotifier::new(ctx.bot.clone(), chat_id);
    ctx.orchestrator
        .resolve_confirmation(principal, job_id, decision, &notifier)
        .await;
    Ok(())
}

pub fn principal_of(msg: &Message) -> Option<Principal> {
    msg.from.as_ref().map(|u| Principal(u.id.0))
}

/// Sort a message into a command, a printable offer, or neither.
pub fn parse_message(msg: &Message) -> Inbound {
    let MessageKind::Common(common) = &msg.kind else {
        return Inbound::Other;
    };
    match &common.media_kind {
        MediaKind::Text(t) => match command_name(&t.text) {
            Some("start") => Inbound::Start,
            Some("status") => Inbound::Status,
            _ => Inbound::Other,
        },
        MediaKind::Document(d) => Inbound::File(InboundFile::Document {
            file_id: d.document.file.id.clone(),
            name: d.document.file_name.clone(),
            declared_size: Some(u64::from(d.document.file.size)),
            declared_mime: d.document.mime_type.as_ref().map(ToString::to_string),
        }),
        // Telegram lists sizes smallest first; print the largest.
        MediaKind::Photo(p) => match p.photo.last() {
            Some(ps) => Inbound::File(InboundFile::Photo {
                file_id: ps.file.id.clone(),
                width: ps.width,
                height: ps.height,
                size: Some(u64::from(ps.file.size)),
            }),
            None => Inbound::Other,
        },
        _ => Inbound::Other,
    }
}

/// `/status@print_bot now` → `status`.
fn command_name(text: &str) -> Option<&str> {
    let word = text.split_whitespace().next()?.strip_prefix('/')?;
    let name = word.split('@').next().unwrap_or(word);
    (!name.is_empty()).then_some(name)
}
