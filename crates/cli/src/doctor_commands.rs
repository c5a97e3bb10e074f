//! `printrelay doctor`: configuration and environment audit.
//!
//! Loads settings the same way `run` does, looks for the external tools the
//! print pipeline shells out to and checks the work directory is writable, then prints a
//! report with `[ok]`, `[warn]`, `[fail]`, `[skip]` or `[info]` per item.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    anyhow::Result,
    printrelay_config::{AuthorizationPolicy, Settings},
    printrelay_print::{
        Converter, ProcessRunner,
        command::find_on_path,
        spooler::{STATUS_PROGRAM, SUBMIT_PROGRAM},
    },
    secrecy::ExposeSecret,
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Per-check result used to build the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Skip,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Skip => DIM,
            Self::Info => CYAN,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }
}

// ── Printing ────────────────────────────────────────────────────────────────

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
            match item.status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                _ => {},
            }
        }
        eprintln!();
    }

    (errors, warnings)
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub async fn handle_doctor() -> Result<()> {
    eprintln!("{BOLD}printrelay doctor{RESET}");
    eprintln!("{BOLD}================={RESET}\n");

    let mut sections = Vec::new();

    let (config_section, settings) = check_config(|name| std::env::var(name).ok());
    sections.push(config_section);

    match settings {
        Some(settings) => {
            sections.push(check_tools(&settings, find_on_path));
            sections.push(check_work_dir(&settings.work_dir));
        },
        None => {
            let mut skipped = Section::new("Tools and work directory");
            skipped.push(Status::Skip, "configuration invalid, nothing else checked");
            sections.push(skipped);
        },
    }

    let (errors, warnings) = print_report(&sections);

    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

// ── 1. Configuration ────────────────────────────────────────────────────────

fn check_config(lookup: impl Fn(&str) -> Option<String>) -> (Section, Option<Settings>) {
    let mut section = Section::new("Configuration");

    let settings = match printrelay_config::from_lookup(lookup) {
        Ok(settings) => settings,
        Err(e) => {
            section.push(Status::Fail, e.to_string());
            return (section, None);
        },
    };

    if settings.telegram_token.expose_secret().contains(':') {
        section.push(Status::Ok, "Telegram token present");
    } else {
        section.push(
            Status::Warn,
            "Telegram token present but does not look like a bot token",
        );
    }

    section.push(Status::Info, format!("Printer: {}", settings.printer));
    if settings.debug {
        section.push(Status::Warn, "Debug mode on: jobs go to the debug printer");
    }

    match &settings.allowed_users {
        AuthorizationPolicy::Unrestricted => {
            section.push(Status::Warn, "No allowlist: anyone can print");
        },
        AuthorizationPolicy::Allowlist(ids) => {
            section.push(Status::Ok, format!("Allowlist with {} user(s)", ids.len()));
        },
        AuthorizationPolicy::Malformed { invalid } => {
            section.push(
                Status::Fail,
                format!("Allowlist has invalid entries: {}", invalid.join(", ")),
            );
        },
    }

    section.push(
        Status::Info,
        format!(
            "Confirmation above {} page(s), expires after {}s",
            settings.page_confirm_limit,
            settings.confirm_timeout.as_secs()
        ),
    );

    (section, Some(settings))
}

// ── 2. External tools ───────────────────────────────────────────────────────

fn check_tools(settings: &Settings, find: impl Fn(&str) -> Option<PathBuf>) -> Section {
    let mut section = Section::new("Tools");

    for program in [SUBMIT_PROGRAM, STATUS_PROGRAM] {
        match find(program) {
            Some(path) => section.push(Status::Ok, format!("{program}: {}", path.display())),
            None => section.push(Status::Fail, format!("{program} not found on PATH")),
        }
    }

    let converter = Converter::new(Arc::new(ProcessRunner))
        .with_binary(settings.converter_path.clone());
    match converter.locate() {
        Some(path) => section.push(Status::Ok, format!("Converter: {}", path.display())),
        None => section.push(
            Status::Warn,
            "No LibreOffice converter found: only PDFs and images can be printed",
        ),
    }

    section
}

// ── 3. Work directory ───────────────────────────────────────────────────────

fn check_work_dir(dir: &Path) -> Section {
    let mut section = Section::new("Work directory");

    if let Err(e) = std::fs::create_dir_all(dir) {
        section.push(
            Status::Fail,
            format!("Cannot create {}: {e}", dir.display()),
        );
        return section;
    }

    let scratch = dir.join(".printrelay-doctor-check");
    match std::fs::write(&scratch, b"check") {
        Ok(()) => {
            let _ = std::fs::remove_file(&scratch);
            section.push(Status::Ok, format!("{} is writable", dir.display()));
        },
        Err(e) => {
            section.push(
                Status::Fail,
                format!("{} is not writable: {e}", dir.display()),
            );
        },
    }

    section
}

// ── Tests ───────────────────────────────────────────────────────────────────
