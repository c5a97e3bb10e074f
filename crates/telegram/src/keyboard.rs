//! Reply and inline keyboards, and the callback payloads behind them.

use {
    printrelay_common::types::JobId,
    printrelay_print::ConfirmDecision,
    teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup},
};

pub const CONFIRM_PREFIX: &str = "print_confirm:";
pub const DECLINE_PREFIX: &str = "print_decline:";

/// Persistent keyboard offering the two commands.
pub fn reply_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new("/start"),
        KeyboardButton::new("/status"),
    ]])
    .resize_keyboard()
}

/// Print/Cancel buttons attached to a confirmation request.
pub fn confirmation_keyboard(job_id: JobId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Print", callback_data(ConfirmDecision::Accept, job_id)),
        InlineKeyboardButton::callback("Cancel", callback_data(ConfirmDecision::Decline, job_id)),
    ]])
}

pub fn callback_data(decision: ConfirmDecision, job_id: JobId) -> String {
    match decision {
        ConfirmDecision::Accept => format!("{CONFIRM_PREFIX}{job_id}"),
        ConfirmDecision::Decline => format!("{DECLINE_PREFIX}{job_id}"),
    }
}

/// Inverse of [`callback_data`]; anything else is not ours.
pub fn parse_callback_data(data: &str) -> Option<(ConfirmDecision, JobId)> {
    let (decision, id) = if let Some(id) = data.strip_prefix(CONFIRM_PREFIX) {
        (ConfirmDecision::Accept, id)
    } else if let Some(id) = data.strip_prefix(DECLINE_PREFIX) {
        (ConfirmDecision::Decline, id)
    } else {
        return None;
    };
    id.parse().ok().map(|id| (decision, id))
}
