//! Jobs held until their owner confirms a long print.

use std::{collections::HashMap, sync::Arc, time::Instant};

use {
    printrelay_common::types::{JobId, Principal},
    tokio::sync::RwLock,
    tracing::{debug, warn},
};

use crate::{job::PrintJob, transport::Notifier};

pub struct PendingJob {
    pub job: PrintJob,
    /// Where the eventual outcome is reported.
    pub notifier: Arc<dyn Notifier>,
    pub held_since: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeError {
    /// Never held, or already resolved.
    NotFound,
    /// Held for somebody else; left in place.
    WrongOwner,
}

/// Shared map of held jobs. Removal is the only way to resolve a job, so
/// whoever removes it first (accept, decline or timeout) wins.
#[derive(Clone, Default)]
pub struct PendingConfirmations {
    inner: Arc<RwLock<HashMap<JobId, PendingJob>>>,
}

impl PendingConfirmations {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: PrintJob, notifier: Arc<dyn Notifier>) -> JobId {
        let id = job.id;
        debug!(job_id = %id, principal = %job.principal, "holding job for confirmation");
        self.inner.write().await.insert(id, PendingJob {
            job,
            notifier,
            held_since: Instant::now(),
        });
        id
    }

    /// Remove the job if `principal` owns it.
    pub async fn take(&self, id: JobId, principal: Principal) -> Result<PendingJob, TakeError> {
        let mut pending = self.inner.write().await;
        match pending.get(&id) {
            None => Err(TakeError::NotFound),
            Some(held) if held.job.principal != principal => {
                warn!(job_id = %id, %principal, owner = %held.job.principal, "confirmation from non-owner");
                Err(TakeError::WrongOwner)
            },
            Some(_) => pending.remove(&id).ok_or(TakeError::NotFound),
        }
    }

    /// Remove the job regardless of owner, for the timeout path.
    pub async fn expire(&self, id: JobId) -> Option<PendingJob> {
        self.inner.write().await.remove(&id)
    }

    /// Remove everything, e.g. on shutdown.
    pub async fn drain(&self) -> Vec<PendingJob> {
        self.inner.write().await.drain().map(|(_, held)| held).collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn ids(&self) -> Vec<JobId> {
        self.inner.read().await.keys().copied().collect()
    }
}
