//! The print-job pipeline.
//!
//! A file offered by a chat user goes through the access gate, is downloaded
//! into the work directory, classified by content, converted to PDF when it
//! is an office document, held for confirmation when it is long, submitted to
//! the CUPS spooler and finally removed from disk.

pub mod access;
pub mod command;
pub mod convert;
pub mod error;
pub mod job;
pub mod notice;
pub mod orchestrator;
pub mod pending;
pub mod spooler;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    access::{AccessDenied, authorize},
    command::{CommandOutput, CommandRunner, Invocation, ProcessRunner},
    convert::Converter,
    error::{CommandError, ConvertError, SpoolerError},
    job::{InboundFile, JobOutcome, JobState, PrintJob},
    notice::Notice,
    orchestrator::{ConfirmDecision, PrintOrchestrator},
    pending::PendingConfirmations,
    spooler::Spooler,
    transport::{FileSource, Notifier},
};
