use std::{collections::BTreeSet, path::PathBuf, time::Duration};

use {
    printrelay_common::types::{Principal, PrinterTarget},
    secrecy::Secret,
};

/// Default page count above which a job waits for the sender to confirm.
pub const DEFAULT_PAGE_CONFIRM_LIMIT: u32 = 20;

/// How long a job may wait for confirmation before it is dropped.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(300);

/// Printer used instead of the production one when `DEBUG` is set.
pub const DEFAULT_DEBUG_PRINTER: &str = "PDF";

/// Who may use the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthorizationPolicy {
    /// No restriction configured.
    #[default]
    Unrestricted,
    /// Only these principals.
    Allowlist(BTreeSet<Principal>),
    /// A restriction was configured but could not be understood. Kept so the
    /// access gate can fail closed if such a value ever reaches it.
    Malformed { invalid: Vec<String> },
}

impl AuthorizationPolicy {
    /// Parse a comma separated list of numeric user ids.
    ///
    /// Blank entries are dropped; a missing or effectively empty list means
    /// no restriction. Any non-numeric entry makes the whole policy malformed.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Unrestricted;
        };

        let entries: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if entries.is_empty() {
            return Self::Unrestricted;
        }

        let mut ids = BTreeSet::new();
        let mut invalid = Vec::new();
        for entry in entries {
            match entry.parse::<Principal>() {
                Ok(id) => {
                    ids.insert(id);
                },
                Err(_) => invalid.push(entry.to_string()),
            }
        }

        if invalid.is_empty() {
            Self::Allowlist(ids)
        } else {
            Self::Malformed { invalid }
        }
    }

    #[must_use]
    pub fn is_restricted(&self) -> bool {
        !matches!(self, Self::Unrestricted)
    }
}

/// Immutable process settings.
#[derive(Clone)]
pub struct Settings {
    /// Bot token from @BotFather.
    pub telegram_token: Secret<String>,

    /// Non-production run; prints go to the debug printer.
    pub debug: bool,

    /// Resolved printer for this process.
    pub printer: PrinterTarget,

    pub allowed_users: AuthorizationPolicy,

    /// Jobs with more pages than this need explicit confirmation.
    pub page_confirm_limit: u32,

    pub confirm_timeout: Duration,

    /// Where downloads and converted artifacts live.
    pub work_dir: PathBuf,

    /// Explicit converter binary; otherwise `soffice`/`libreoffice` on `PATH`.
    pub converter_path: Option<PathBuf>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("telegram_token", &"[REDACTED]")
            .field("debug", &self.debug)
            .field("printer", &self.printer)
            .field("allowed_users", &self.allowed_users)
            .field("page_confirm_limit", &self.page_confirm_limit)
            .field("confirm_timeout", &self.confirm_timeout)
            .field("work_dir", &self.work_dir)
            .field("converter_path", &self.converter_path)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            telegram_token: Secret::new(String::new()),
            debug: false,
            printer: PrinterTarget::SystemDefault,
            allowed_users: AuthorizationPolicy::Unrestricted,
            page_confirm_limit: DEFAULT_PAGE_CONFIRM_LIMIT,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
            work_dir: default_work_dir(),
            converter_path: None,
        }
    }
}

pub fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("printrelay")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case::absent(None)]
    #[case::empty(Some(""))]
    #[case::only_separators(Some(" , , "))]
    fn empty_lists_are_unrestricted(#[case] raw: Option<&str>) {
        assert_eq!(
            AuthorizationPolicy::parse(raw),
            AuthorizationPolicy::Unrestricted
        );
    }

    #[test]
    fn parses_ids_with_whitespace() {
        let policy = AuthorizationPolicy::parse(Some(" 1001 ,2002,, 3003 "));
        let AuthorizationPolicy::Allowlist(ids) = policy else {
            panic!("expected allowlist, got {policy:?}");
        };
        assert_eq!(
            ids.into_iter().collect::<Vec<_>>(),
            vec![Principal(1001), Principal(2002), Principal(3003)]
        );
    }

    #[test]
    fn any_bad_id_makes_policy_malformed() {
        assert_eq!(
            AuthorizationPolicy::parse(Some("1001, alice, 2002, @bob")),
            AuthorizationPolicy::Malformed {
                invalid: vec!["alice".into(), "@bob".into()]
            }
        );
    }

    #[test]
    fn debug_redacts_token() {
        let settings = Settings {
            telegram_token: Secret::new("123:SECRET".into()),
            ..Default::default()
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("SECRET"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
