//! Drives a print job from the offered file to the spooler.
//!
//! Every entry point starts at the access gate. A job that gets past the
//! download step always ends with its files removed, except while it is held
//! for confirmation; the held job is cleaned up by whichever of accept,
//! decline or timeout resolves it.

use std::{path::PathBuf, sync::Arc};

use {
    printrelay_common::types::{JobId, Principal},
    printrelay_config::Settings,
    printrelay_media::{Classification, ClassifiedFile},
    serde::{Deserialize, Serialize},
    tracing::{debug, error, info, warn},
};

use crate::{
    access::authorize,
    command::CommandRunner,
    convert::Converter,
    job::{InboundFile, JobOutcome, JobState, PrintJob},
    notice::Notice,
    pending::PendingConfirmations,
    spooler::Spooler,
    transport::{FileSource, Notifier},
};

/// Answer to a confirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmDecision {
    Accept,
    Decline,
}

/// Where preparation left a job that is still alive.
enum Prepared {
    Ready,
    NeedsConfirmation { pages: u32 },
}

pub struct PrintOrchestrator {
    settings: Arc<Settings>,
    converter: Converter,
    spooler: Spooler,
    pending: PendingConfirmations,
}

impl PrintOrchestrator {
    pub fn new(settings: Arc<Settings>, runner: Arc<dyn CommandRunner>) -> Self {
        let converter =
            Converter::new(Arc::clone(&runner)).with_binary(settings.converter_path.clone());
        Self {
            settings,
            converter,
            spooler: Spooler::new(runner),
            pending: PendingConfirmations::new(),
        }
    }

    #[must_use]
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn pending(&self) -> &PendingConfirmations {
        &self.pending
    }

    fn admit(&self, principal: Principal) -> bool {
        authorize(principal, &self.settings.allowed_users).is_ok()
    }

    /// Reply to `/start`.
    pub async fn greet(&self, principal: Principal, notifier: &dyn Notifier) {
        let notice = if self.admit(principal) {
            Notice::Greeting
        } else {
            Notice::Unauthorized
        };
        send(notifier, notice).await;
    }

    /// Reply to `/status` with the spooler queue.
    pub async fn queue_status(&self, principal: Principal, notifier: &dyn Notifier) {
        if !self.admit(principal) {
            send(notifier, Notice::Unauthorized).await;
            return;
        }
        let notice = match self.spooler.queue().await {
            Ok(queue) if queue.is_empty() => Notice::QueueEmpty,
            Ok(queue) => Notice::Queue(queue),
            Err(e) => {
                error!(%principal, error = %e, "could not read the print queue");
                Notice::QueueStatusFailed
            },
        };
        send(notifier, notice).await;
    }

    /// Reply to a message that carries neither a document nor a photo.
    pub async fn reject_unsupported_message(&self, principal: Principal, notifier: &dyn Notifier) {
        let notice = if self.admit(principal) {
            Notice::UnsupportedMessage
        } else {
            Notice::Unauthorized
        };
        send(notifier, notice).await;
    }

    /// Run the pipeline for one offered file.
    pub async fn handle_file(
        &self,
        principal: Principal,
        file: InboundFile,
        source: &dyn FileSource,
        notifier: Arc<dyn Notifier>,
    ) -> JobOutcome {
        if !self.admit(principal) {
            send(notifier.as_ref(), Notice::Unauthorized).await;
            return JobOutcome::Rejected;
        }

        let mut job = PrintJob::new(principal, &self.settings.work_dir, &file);
        job.advance(JobState::Authorized);
        match &file {
            InboundFile::Document {
                name,
                declared_size,
                declared_mime,
                ..
            } => info!(
                job_id = %job.id,
                %principal,
                declared_name = ?name,
                ?declared_size,
                ?declared_mime,
                "document received"
            ),
            InboundFile::Photo {
                width,
                height,
                size,
                ..
            } => info!(job_id = %job.id, %principal, width, height, ?size, "photo received"),
        }

        let prepared = self.prepare(&mut job, &file, source, notifier.as_ref()).await;
        let outcome = match prepared {
            Ok(Prepared::Ready) => self.submit(&mut job, notifier.as_ref()).await,
            Ok(Prepared::NeedsConfirmation { pages }) => {
                return self.hold(job, pages, notifier).await;
            },
            Err(outcome) => outcome,
        };
        job.cleanup().await;
        info!(job_id = %job.id, ?outcome, "print job finished");
        outcome
    }

    /// Resolve a held job on behalf of `principal`.
    pub async fn resolve_confirmation(
        &self,
        principal: Principal,
        job_id: JobId,
        decision: ConfirmDecision,
        notifier: &dyn Notifier,
    ) -> JobOutcome {
        if !self.admit(principal) {
            send(notifier, Notice::Unauthorized).await;
            return JobOutcome::Rejected;
        }

        let held = match self.pending.take(job_id, principal).await {
            Ok(held) => held,
            Err(reason) => {
                info!(%job_id, %principal, ?reason, "no pending job to resolve");
                send(notifier, Notice::ConfirmationUnknown).await;
                return JobOutcome::Rejected;
            },
        };

        let mut job = held.job;
        info!(
            %job_id,
            ?decision,
            waited_ms = u64::try_from(held.held_since.elapsed().as_millis()).unwrap_or(u64::MAX),
            "confirmation received"
        );
        let outcome = match decision {
            ConfirmDecision::Accept => self.submit(&mut job, notifier).await,
            ConfirmDecision::Decline => {
                send(notifier, Notice::Cancelled).await;
                JobOutcome::Cancelled
            },
        };
        job.cleanup().await;
        outcome
    }

    /// Drop every held job and remove its files.
    pub async fn shutdown(&self) {
        for mut held in self.pending.drain().await {
            warn!(job_id = %held.job.id, "discarding unconfirmed job on shutdown");
            held.job.cleanup().await;
        }
    }

    async fn prepare(
        &self,
        job: &mut PrintJob,
        file: &InboundFile,
        source: &dyn FileSource,
        notifier: &dyn Notifier,
    ) -> Result<Prepared, JobOutcome> {
        if let Err(e) = tokio::fs::create_dir_all(&job.dir).await {
            error!(
                job_id = %job.id,
                job_dir = %job.dir.display(),
                error = %e,
                "cannot create job directory"
            );
            return Err(fail(notifier, Notice::Failed).await);
        }

        if let Err(e) = source.fetch(file.file_id(), &job.input).await {
            error!(job_id = %job.id, error = %e, "download failed");
            return Err(fail(notifier, Notice::Failed).await);
        }
        job.advance(JobState::Downloaded);

        if file.is_photo() {
            if !tokio::fs::try_exists(&job.input).await.unwrap_or(false) {
                error!(
                    job_id = %job.id,
                    path = %job.input.display(),
                    "downloaded photo is missing"
                );
                return Err(fail(notifier, Notice::Failed).await);
            }
            job.printable = Some(job.input.clone());
            job.pages = Some(1);
            job.advance(JobState::Classified);
        } else {
            let classified = match classify_blocking(job.input.clone()).await {
                Ok(classified) => classified,
                Err(e) => {
                    error!(job_id = %job.id, error = %e, "classification failed");
                    return Err(fail(notifier, Notice::Failed).await);
                },
            };
            job.advance(JobState::Classified);
            info!(
                job_id = %job.id,
                classification = ?classified.classification,
                mime = %classified.mime,
                "file classified"
            );

            match classified.classification {
                Classification::Unsupported => {
                    send(notifier, Notice::UnsupportedType).await;
                    return Err(JobOutcome::Rejected);
                },
                Classification::PrintableAsIs => job.printable = Some(job.input.clone()),
                Classification::ConvertibleDocument => {
                    job.advance(JobState::Converting);
                    send(notifier, Notice::Preparing).await;
                    match self.converter.convert(&job.input).await {
                        Ok(output) => job.printable = Some(output),
                        Err(e) if e.is_unavailable() => {
                            error!(job_id = %job.id, error = %e, "cannot convert document");
                            return Err(fail(notifier, Notice::PreparationFailed).await);
                        },
                        Err(e) => {
                            warn!(job_id = %job.id, error = %e, "document conversion failed");
                            return Err(fail(notifier, Notice::PreparationFailed).await);
                        },
                    }
                },
            }

            if let Some(printable) = job.printable.clone() {
                job.pages = count_pages_blocking(printable).await;
            }
        }

        let limit = self.settings.page_confirm_limit;
        match job.pages {
            Some(pages) if pages > limit => {
                info!(job_id = %job.id, pages, limit, "page count above confirmation limit");
                Ok(Prepared::NeedsConfirmation { pages })
            },
            pages => {
                debug!(job_id = %job.id, ?pages, "no confirmation needed");
                Ok(Prepared::Ready)
            },
        }
    }

    async fn submit(&self, job: &mut PrintJob, notifier: &dyn Notifier) -> JobOutcome {
        job.advance(JobState::Submitting);
        let Some(path) = job.printable.as_deref() else {
            error!(job_id = %job.id, "no print-ready file to submit");
            return fail(notifier, Notice::Failed).await;
        };
        match self.spooler.submit(path, &self.settings.printer).await {
            Ok(()) => {
                info!(job_id = %job.id, printer = %self.settings.printer, "print job submitted");
                send(notifier, Notice::Submitted).await;
                JobOutcome::Succeeded
            },
            Err(e) => {
                error!(job_id = %job.id, error = %e, "print submission failed");
                fail(notifier, Notice::SubmissionFailed).await
            },
        }
    }

    async fn hold(&self, mut job: PrintJob, pages: u32, notifier: Arc<dyn Notifier>) -> JobOutcome {
        job.advance(JobState::ConfirmationPending);
        let id = self.pending.insert(job, Arc::clone(&notifier)).await;
        self.spawn_expiry(id);
        send(notifier.as_ref(), Notice::ConfirmationRequired {
            job_id: id,
            pages,
            limit: self.settings.page_confirm_limit,
        })
        .await;
        JobOutcome::AwaitingConfirmation(id)
    }

    fn spawn_expiry(&self, id: JobId) {
        let pending = self.pending.clone();
        let timeout = self.settings.confirm_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(mut held) = pending.expire(id).await {
                info!(job_id = %id, timeout_secs = timeout.as_secs(), "confirmation timed out");
                held.job.cleanup().await;
                send(held.notifier.as_ref(), Notice::ConfirmationExpired).await;
            }
        });
    }
}

async fn send(notifier: &dyn Notifier, notice: Notice) {
    if let Err(e) = notifier.notify(notice).await {
        warn!(error = %e, "failed to deliver notice");
    }
}

async fn fail(notifier: &dyn Notifier, notice: Notice) -> JobOutcome {
    send(notifier, notice).await;
    JobOutcome::Failed
}

async fn classify_blocking(path: PathBuf) -> anyhow::Result<ClassifiedFile> {
    let classified = tokio::task::spawn_blocking(move || printrelay_media::classify(&path)).await?;
    match classified {
        Ok(c) => Ok(c),
        Err(e) if e.is_not_found() => {
            Err(anyhow::anyhow!("internal consistency failure, downloaded file vanished: {e}"))
        },
        Err(e) => Err(e.into()),
    }
}

async fn count_pages_blocking(path: PathBuf) -> Option<u32> {
    match tokio::task::spawn_blocking(move || printrelay_media::count_pages(&path)).await {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => {
            warn!(error = %e, "page count unavailable");
            None
        },
        Err(e) => {
            warn!(error = %e, "page count task failed");
            None
        },
    }
}
