//! One print job: what was offered, where it lives on disk, how far it got.

use std::path::{Path, PathBuf};

use {
    printrelay_common::types::{JobId, Principal},
    serde::Serialize,
    tracing::{debug, warn},
};

/// A file offered by a chat user. Declared names, sizes and MIME types come
/// from the sender and are only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFile {
    Document {
        file_id: String,
        name: Option<String>,
        declared_size: Option<u64>,
        declared_mime: Option<String>,
    },
    Photo {
        file_id: String,
        width: u32,
        height: u32,
        size: Option<u64>,
    },
}

impl InboundFile {
    pub fn file_id(&self) -> &str {
        match self {
            Self::Document { file_id, .. } | Self::Photo { file_id, .. } => file_id,
        }
    }

    pub fn is_photo(&self) -> bool {
        matches!(self, Self::Photo { .. })
    }

    /// Download destination inside `dir`.
    ///
    /// Only the last component of a declared name is used, with anything
    /// outside `[A-Za-z0-9._-]` replaced, so nothing lands outside `dir`.
    pub fn local_path(&self, dir: &Path) -> PathBuf {
        match self {
            Self::Document { file_id, name, .. } => {
                let file_name = name
                    .as_deref()
                    .and_then(sanitize_file_name)
                    .unwrap_or_else(|| format!("document_{}", sanitize(file_id)));
                dir.join(file_name)
            },
            Self::Photo { file_id, .. } => dir.join(format!("photo_{}.jpg", sanitize(file_id))),
        }
    }
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn sanitize_file_name(name: &str) -> Option<String> {
    // Both separators count; senders on any platform pick the name.
    let last = name.rsplit(['/', '\\']).next()?.trim();
    let clean = sanitize(last);
    if clean.is_empty() || clean.chars().all(|c| c == '.') {
        None
    } else {
        Some(clean)
    }
}

/// Pipeline position of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Received,
    Authorized,
    Downloaded,
    Classified,
    Converting,
    ConfirmationPending,
    Submitting,
    Cleaned,
}

/// How a job ended, or that it is waiting on its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded,
    /// Denied or unsupported; nothing was printed.
    Rejected,
    Failed,
    Cancelled,
    Expired,
    AwaitingConfirmation(JobId),
}

#[derive(Debug)]
pub struct PrintJob {
    pub id: JobId,
    pub principal: Principal,
    /// Private directory under the work directory; every file of the job
    /// lives here.
    pub dir: PathBuf,
    pub input: PathBuf,
    /// PDF or image handed to the spooler; equals `input` unless converted.
    pub printable: Option<PathBuf>,
    pub pages: Option<u32>,
    state: JobState,
    cleaned: bool,
}

impl PrintJob {
    /// A new job for `file`, downloading into `<work_dir>/<job id>/`.
    pub fn new(principal: Principal, work_dir: &Path, file: &InboundFile) -> Self {
        let id = JobId::new();
        let dir = work_dir.join(id.to_string());
        let input = file.local_path(&dir);
        Self {
            id,
            principal,
            dir,
            input,
            printable: None,
            pages: None,
            state: JobState::Received,
            cleaned: false,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn advance(&mut self, state: JobState) {
        debug!(job_id = %self.id, from = ?self.state, to = ?state, "job state change");
        self.state = state;
    }

    /// Files this job may have created, input first.
    pub fn artifacts(&self) -> Vec<&Path> {
        let mut paths = vec![self.input.as_path()];
        if let Some(printable) = self.printable.as_deref()
            && printable != self.input
        {
            paths.push(printable);
        }
        paths
    }

    /// Remove every local artifact and the job directory. Safe to call more
    /// than once; absent files are ignored and other failures are only
    /// logged.
    pub async fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        for path in self.artifacts() {
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!(job_id = %self.id, path = %path.display(), "removed job file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
                Err(e) => {
                    let err = printrelay_common::Error::io("remove", path, e);
                    warn!(job_id = %self.id, error = %err, "cleanup failed");
                },
            }
        }
        // Also catches converter side files next to the input.
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => {
                let err = printrelay_common::Error::io("remove", &self.dir, e);
                warn!(job_id = %self.id, error = %err, "cleanup failed");
            },
        }
        self.cleaned = true;
        self.advance(JobState::Cleaned);
    }
}
