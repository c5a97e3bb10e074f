//! Office document to PDF conversion through a headless LibreOffice.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info, warn};

use crate::{
    command::{CommandRunner, Invocation, find_binary},
    error::ConvertError,
};

/// Binary names searched on `PATH`, in order.
pub const CONVERTER_BINARIES: &[&str] = &["soffice", "libreoffice"];

pub struct Converter {
    runner: Arc<dyn CommandRunner>,
    binary: Option<PathBuf>,
    candidates: Vec<String>,
}

impl Converter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            binary: None,
            candidates: CONVERTER_BINARIES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Prefer an explicitly configured binary.
    #[must_use]
    pub fn with_binary(mut self, binary: Option<PathBuf>) -> Self {
        self.binary = binary;
        self
    }

    /// Replace the names searched on `PATH`.
    #[must_use]
    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Locate the converter binary, if any.
    pub fn locate(&self) -> Option<PathBuf> {
        find_binary(self.binary.as_deref(), &self.candidates)
    }

    /// Convert `input` into a PDF placed next to it and return the PDF path.
    ///
    /// A zero exit is not trusted on its own: the expected output must exist
    /// afterwards. Whatever a failed run left behind at the output path is
    /// removed.
    pub async fn convert(&self, input: &Path) -> Result<PathBuf, ConvertError> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(ConvertError::NotFound {
                path: input.to_path_buf(),
            });
        }

        let binary = self.locate().ok_or(ConvertError::Unavailable)?;

        let output = pdf_output_path(input);
        if output == input {
            return Err(ConvertError::OutputCollision { path: output });
        }
        if tokio::fs::try_exists(&output).await.unwrap_or(false) {
            warn!(path = %output.display(), "removing stale conversion output");
            discard(&output).await;
        }

        let out_dir = input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let invocation = Invocation::new(binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(input);

        info!(input = %input.display(), command = %invocation, "converting document to PDF");
        if let Err(e) = self.runner.run(&invocation).await {
            discard(&output).await;
            return Err(ConvertError::Failed(e));
        }

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(ConvertError::NoOutput { expected: output });
        }

        debug!(output = %output.display(), "conversion finished");
        Ok(output)
    }
}

/// `dir/report.docx` → `dir/report.pdf`.
pub fn pdf_output_path(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed partial conversion output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove conversion output"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use {
        super::*,
        crate::testing::{FakeRunner, fake_binary},
    };

    fn converter(runner: &Arc<FakeRunner>, dir: &TempDir) -> Converter {
        Converter::new(runner.clone()).with_binary(Some(fake_binary(dir, "soffice")))
    }

    #[test]
    fn output_path_replaces_extension() {
        assert_eq!(
            pdf_output_path(Path::new("/tmp/printrelay/report.docx")),
            PathBuf::from("/tmp/printrelay/report.pdf")
        );
        assert_eq!(
            pdf_output_path(Path::new("/tmp/printrelay/README")),
            PathBuf::from("/tmp/printrelay/README.pdf")
        );
    }

    #[tokio::test]
    async fn runs_headless_conversion_into_input_dir() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("report.docx");
        std::fs::write(&input, b"PK\x03\x04").unwrap();
        let runner = Arc::new(FakeRunner::default());

        let output = converter(&runner, &dir).convert(&input).await.unwrap();

        assert_eq!(output, dir.path().join("report.pdf"));
        assert!(output.exists());
        let calls = runner.invocations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program_name(), "soffice");
        assert_eq!(calls[0].argv(), vec![
            "--headless".to_string(),
            "--convert-to".into(),
            "pdf".into(),
            "--outdir".into(),
            dir.path().to_string_lossy().into_owned(),
            input.to_string_lossy().into_owned(),
        ]);
    }

    #[tokio::test]
    async fn missing_tool_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("report.docx");
        std::fs::write(&input, b"PK\x03\x04").unwrap();
        let runner = Arc::new(FakeRunner::default());

        let err = Converter::new(runner.clone())
            .with_candidates(vec!["printrelay-no-such-converter".into()])
            .convert(&input)
            .await
            .unwrap_err();

        assert!(err.is_unavailable(), "got {err}");
        assert!(runner.invocations().is_empty());
    }

    #[tokio::test]
    async fn failed_run_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("report.docx");
        std::fs::write(&input, b"PK\x03\x04").unwrap();
        let runner = Arc::new(FakeRunner {
            convert_fails: true,
            ..Default::default()
        });

        let err = converter(&runner, &dir).convert(&input).await.unwrap_err();

        assert!(matches!(err, ConvertError::Failed(_)), "got {err}");
        assert!(!dir.path().join("report.pdf").exists());
    }

    #[tokio::test]
    async fn silent_failure_without_output_is_detected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("report.docx");
        std::fs::write(&input, b"PK\x03\x04").unwrap();
        let runner = Arc::new(FakeRunner {
            convert_writes_nothing: true,
            ..Default::default()
        });

        let err = converter(&runner, &dir).convert(&input).await.unwrap_err();

        assert!(matches!(err, ConvertError::NoOutput { .. }), "got {err}");
    }

    #[tokio::test]
    async fn missing_input_is_not_found() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let err = converter(&runner, &dir)
            .convert(&dir.path().join("gone.docx"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::NotFound { .. }), "got {err}");
    }

    #[tokio::test]
    async fn document_disguised_as_pdf_is_refused() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("report.pdf");
        std::fs::write(&input, b"PK\x03\x04").unwrap();
        let runner = Arc::new(FakeRunner::default());

        let err = converter(&runner, &dir).convert(&input).await.unwrap_err();

        assert!(matches!(err, ConvertError::OutputCollision { .. }), "got {err}");
        assert!(input.exists());
        assert!(runner.invocations().is_empty());
    }
}
