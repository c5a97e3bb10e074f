use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure of an external process.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {}: {stderr}", exit_label(*code))]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("file to convert not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("no document converter (soffice/libreoffice) found on PATH")]
    Unavailable,

    #[error("conversion would overwrite its own input {}", path.display())]
    OutputCollision { path: PathBuf },

    #[error("conversion command failed: {0}")]
    Failed(#[source] CommandError),

    #[error("conversion did not produce {}", expected.display())]
    NoOutput { expected: PathBuf },
}

impl ConvertError {
    /// Whether the tool itself is missing, as opposed to a failed run.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

#[derive(Debug, Error)]
pub enum SpoolerError {
    #[error("print submission failed: {0}")]
    SubmissionFailed(#[source] CommandError),

    #[error("printer status unavailable: {0}")]
    StatusUnavailable(#[source] CommandError),
}
