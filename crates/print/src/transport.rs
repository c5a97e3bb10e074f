//! Seams to the chat transport: fetching offered files and talking back.

use std::path::Path;

use async_trait::async_trait;

use crate::notice::Notice;

/// Delivers notices to the person who started a job.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: Notice) -> anyhow::Result<()>;
}

/// Downloads the bytes behind a transport file handle.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Write the file identified by `file_id` to `dest`.
    async fn fetch(&self, file_id: &str, dest: &Path) -> anyhow::Result<()>;
}
