//! Fixed vocabulary of messages sent back to users.
//!
//! Texts never include paths, tool output or error details; those go to the
//! log only.

use {printrelay_common::types::JobId, serde::Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Notice {
    Greeting,
    Unauthorized,
    /// Neither a document nor a photo.
    UnsupportedMessage,
    UnsupportedType,
    Preparing,
    PreparationFailed,
    /// Generic failure for acquisition and internal errors.
    Failed,
    ConfirmationRequired {
        job_id: JobId,
        pages: u32,
        limit: u32,
    },
    ConfirmationExpired,
    ConfirmationUnknown,
    Cancelled,
    SubmissionFailed,
    Submitted,
    Queue(String),
    QueueEmpty,
    QueueStatusFailed,
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Self::Greeting => "Hi! Send me a document or a photo and I will print it. \
                               Use /status to see the printer queue."
                .into(),
            Self::Unauthorized => "Sorry, you are not allowed to use this printer.".into(),
            Self::UnsupportedMessage => "I can only print documents and photos.".into(),
            Self::UnsupportedType => "Sorry, I can't print this type of file. \
                                      Send a PDF, an image or an office document."
                .into(),
            Self::Preparing => "Preparing your document for printing...".into(),
            Self::PreparationFailed => {
                "Sorry, the document could not be prepared for printing.".into()
            },
            Self::Failed => {
                "Something went wrong while handling your file. Please try again.".into()
            },
            Self::ConfirmationRequired { pages, limit, .. } => format!(
                "This document has {pages} pages, more than the limit of {limit}. \
                 Print it anyway?"
            ),
            Self::ConfirmationExpired => {
                "No confirmation received, the print job was cancelled.".into()
            },
            Self::ConfirmationUnknown => {
                "This print job is no longer waiting for confirmation.".into()
            },
            Self::Cancelled => "OK, the print job was cancelled.".into(),
            Self::SubmissionFailed => "Sorry, printing failed. Please try again later.".into(),
            Self::Submitted => "Sent to the printer.".into(),
            Self::Queue(queue) => format!("Print queue:\n{queue}"),
            Self::QueueEmpty => "The print queue is empty.".into(),
            Self::QueueStatusFailed => "Sorry, could not get the printer status.".into(),
        }
    }

    /// Job waiting on this notice's answer, if any.
    pub fn pending_job(&self) -> Option<JobId> {
        match self {
            Self::ConfirmationRequired { job_id, .. } => Some(*job_id),
            _ => None,
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}
