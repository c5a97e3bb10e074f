//! CUPS client: `lp` for submission, `lpstat` for the queue.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    printrelay_common::types::PrinterTarget,
    tracing::{debug, info},
};

use crate::{
    command::{CommandRunner, Invocation},
    error::SpoolerError,
};

pub const SUBMIT_PROGRAM: &str = "lp";
pub const STATUS_PROGRAM: &str = "lpstat";

pub struct Spooler {
    runner: Arc<dyn CommandRunner>,
    submit_program: PathBuf,
    status_program: PathBuf,
}

impl Spooler {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            submit_program: PathBuf::from(SUBMIT_PROGRAM),
            status_program: PathBuf::from(STATUS_PROGRAM),
        }
    }

    /// Hand `path` to the spooler. Nothing is tracked after acceptance.
    pub async fn submit(&self, path: &Path, target: &PrinterTarget) -> Result<(), SpoolerError> {
        let invocation = submit_invocation(&self.submit_program, path, target);
        info!(file = %path.display(), %target, "submitting to spooler");
        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(SpoolerError::SubmissionFailed)?;
        info!(response = %output.stdout.trim(), "spooler accepted the file");
        Ok(())
    }

    /// Raw queue listing; an empty string means an empty queue.
    pub async fn queue(&self) -> Result<String, SpoolerError> {
        let invocation = Invocation::new(&self.status_program).arg("-o");
        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(SpoolerError::StatusUnavailable)?;
        let queue = output.stdout.trim().to_string();
        debug!(lines = queue.lines().count(), "queue listing received");
        Ok(queue)
    }
}

/// `lp [-d <printer>] <path>`; the printer name sits right before the path.
pub fn submit_invocation(program: &Path, path: &Path, target: &PrinterTarget) -> Invocation {
    let mut invocation = Invocation::new(program);
    if let Some(name) = target.name() {
        invocation = invocation.arg("-d").arg(name);
    }
    invocation.arg(path)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{error::CommandError, testing::FakeRunner},
    };

    #[test]
    fn named_printer_precedes_path() {
        let inv = submit_invocation(
            Path::new("lp"),
            Path::new("/tmp/printrelay/report.pdf"),
            &PrinterTarget::Named("Office_Laser".into()),
        );
        assert_eq!(inv.argv(), vec![
            "-d",
            "Office_Laser",
            "/tmp/printrelay/report.pdf"
        ]);
    }

    #[test]
    fn default_printer_has_no_flag() {
        let inv = submit_invocation(
            Path::new("lp"),
            Path::new("/tmp/printrelay/report.pdf"),
            &PrinterTarget::SystemDefault,
        );
        assert_eq!(inv.argv(), vec!["/tmp/printrelay/report.pdf"]);
    }

    #[tokio::test]
    async fn submit_failure_is_reported() {
        let runner = Arc::new(FakeRunner {
            submit_fails: true,
            ..Default::default()
        });
        let err = Spooler::new(runner)
            .submit(Path::new("/tmp/x.pdf"), &PrinterTarget::SystemDefault)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SpoolerError::SubmissionFailed(CommandError::NonZeroExit { .. })
        ));
    }

    #[tokio::test]
    async fn queue_output_is_trimmed() {
        let runner = Arc::new(FakeRunner {
            queue: Some("PDF-12  alice  1024  Mon 01 Jan\n".into()),
            ..Default::default()
        });
        let spooler = Spooler::new(runner.clone());
        assert_eq!(spooler.queue().await.unwrap(), "PDF-12  alice  1024  Mon 01 Jan");
        assert_eq!(runner.invocations()[0].argv(), vec!["-o"]);
    }

    #[tokio::test]
    async fn empty_queue_is_not_an_error() {
        let runner = Arc::new(FakeRunner {
            queue: Some("\n".into()),
            ..Default::default()
        });
        assert_eq!(Spooler::new(runner).queue().await.unwrap(), "");
    }

    #[tokio::test]
    async fn status_failure_is_unavailable() {
        let runner = Arc::new(FakeRunner::default());
        let err = Spooler::new(runner).queue().await.unwrap_err();
        assert!(matches!(err, SpoolerError::StatusUnavailable(_)));
    }
}
