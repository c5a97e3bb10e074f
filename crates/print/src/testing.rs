//! In-memory stand-ins for the external tools and the chat transport.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use {
    async_trait::async_trait,
    printrelay_config::Settings,
    tempfile::TempDir,
};

use crate::{
    command::{CommandOutput, CommandRunner, Invocation},
    error::CommandError,
    notice::Notice,
    transport::{FileSource, Notifier},
};

/// A well-formed PDF with `pages` empty A4 pages.
pub fn pdf_bytes(pages: u32) -> Vec<u8> {
    use lopdf::{Document, Object, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::from(pages),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Bytes of a tiny but well-formed `.docx` container.
pub fn docx_bytes() -> Vec<u8> {
    use std::io::Write;

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, contents) in [
        ("[Content_Types].xml", &b"<Types/>"[..]),
        ("word/document.xml", &b"<w:document/>"[..]),
    ] {
        zip.start_file(name, zip::write::FileOptions::default()).unwrap();
        zip.write_all(contents).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Empty file standing in for an installed tool.
pub fn fake_binary(dir: &TempDir, name: &str) -> PathBuf {
    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let path = bin.join(name);
    std::fs::write(&path, b"").unwrap();
    path
}

/// Scripted runner keyed on the program name.
#[derive(Default)]
pub struct FakeRunner {
    pub convert_fails: bool,
    pub convert_writes_nothing: bool,
    /// Pages of the PDF a successful conversion writes (1 when unset).
    pub converted_pages: Option<u32>,
    pub submit_fails: bool,
    /// `lpstat` output; `None` makes `lpstat` fail.
    pub queue: Option<String>,
    /// Runs against the submitted file while `lp` "prints" it.
    pub on_submit: Option<fn(&Path)>,
    pub calls: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|i| i.program_name() == program)
            .collect()
    }

    fn failure(program: &str) -> CommandError {
        CommandError::NonZeroExit {
            program: program.into(),
            code: Some(1),
            stderr: format!("{program}: scripted failure"),
        }
    }

    /// `--headless --convert-to pdf --outdir <dir> <input>`
    fn convert(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        let out_dir = PathBuf::from(&invocation.args[4]);
        let input = PathBuf::from(&invocation.args[5]);
        let output = out_dir.join(input.with_extension("pdf").file_name().unwrap());

        if self.convert_fails {
            std::fs::write(&output, b"%PDF-1.4 truncated").unwrap();
            return Err(Self::failure(&invocation.program_name()));
        }
        if !self.convert_writes_nothing {
            std::fs::write(&output, pdf_bytes(self.converted_pages.unwrap_or(1))).unwrap();
        }
        Ok(CommandOutput::default())
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(invocation.clone());
        match invocation.program_name().as_str() {
            "soffice" | "libreoffice" => self.convert(invocation),
            "lp" if self.submit_fails => Err(Self::failure("lp")),
            "lp" => {
                if let (Some(hook), Some(file)) = (self.on_submit, invocation.args.last()) {
                    hook(Path::new(file));
                }
                Ok(CommandOutput {
                    stdout: "request id is PDF-1 (1 file(s))\n".into(),
                    stderr: String::new(),
                })
            },
            "lpstat" => match &self.queue {
                Some(queue) => Ok(CommandOutput {
                    stdout: queue.clone(),
                    stderr: String::new(),
                }),
                None => Err(Self::failure("lpstat")),
            },
            other => Err(Self::failure(other)),
        }
    }
}

/// File source serving fixed bytes per file id.
#[derive(Default)]
pub struct FakeSource {
    pub files: HashMap<String, Vec<u8>>,
    /// Report success without writing anything.
    pub skip_write: bool,
    pub fetches: AtomicUsize,
}

impl FakeSource {
    pub fn with(file_id: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let mut files = HashMap::new();
        files.insert(file_id.to_string(), bytes.into());
        Self {
            files,
            ..Default::default()
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSource for FakeSource {
    async fn fetch(&self, file_id: &str, dest: &Path) -> anyhow::Result<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .files
            .get(file_id)
            .ok_or_else(|| anyhow::anyhow!("unknown file id {file_id}"))?;
        if !self.skip_write {
            tokio::fs::write(dest, bytes).await?;
        }
        Ok(())
    }
}

/// Records every notice in order.
#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: Notice) -> anyhow::Result<()> {
        self.notices.lock().unwrap().push(notice);
        Ok(())
    }
}

/// Settings pointing the work directory into `dir`.
pub fn settings(dir: &TempDir) -> Settings {
    Settings {
        work_dir: dir.path().join("work"),
        ..Default::default()
    }
}

/// Everything left under the work directory, directories included, sorted.
pub fn leftovers(settings: &Settings) -> Vec<PathBuf> {
    fn walk(dir: &Path, found: &mut Vec<PathBuf>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, found);
            }
            found.push(path);
        }
    }

    let mut found = Vec::new();
    walk(&settings.work_dir, &mut found);
    found.sort();
    found
}
