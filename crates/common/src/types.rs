use std::{fmt, str::FromStr};

use {
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// Numeric identity of the person asking for a print, as reported by the
/// chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(pub u64);

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Principal {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

/// Which printer the spooler should target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum PrinterTarget {
    Named(String),
    #[default]
    SystemDefault,
}

impl PrinterTarget {
    /// Blank names collapse to the system default.
    #[must_use]
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some(n) if !n.is_empty() => Self::Named(n.to_string()),
            _ => Self::SystemDefault,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(n) => Some(n),
            Self::SystemDefault => None,
        }
    }
}

impl fmt::Display for PrinterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => write!(f, "printer {n}"),
            Self::SystemDefault => write!(f, "the default printer"),
        }
    }
}

/// Identifier of a single print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_parses_trimmed_digits() {
        assert_eq!(" 377114917 ".parse::<Principal>().unwrap(), Principal(377114917));
        assert!("alice".parse::<Principal>().is_err());
        assert!("-5".parse::<Principal>().is_err());
    }

    #[test]
    fn blank_printer_name_means_default() {
        assert_eq!(PrinterTarget::from_name(None), PrinterTarget::SystemDefault);
        assert_eq!(PrinterTarget::from_name(Some("  ")), PrinterTarget::SystemDefault);
        assert_eq!(
            PrinterTarget::from_name(Some(" Office_Laser ")),
            PrinterTarget::Named("Office_Laser".into())
        );
        assert_eq!(PrinterTarget::SystemDefault.name(), None);
    }

    #[test]
    fn job_id_roundtrips_through_text() {
        let id = JobId::new();
        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-job".parse::<JobId>().is_err());
    }

    #[test]
    fn printer_target_serializes_tagged() {
        let json = serde_json::to_string(&PrinterTarget::Named("PDF".into())).unwrap();
        assert_eq!(json, r#"{"kind":"named","name":"PDF"}"#);
    }
}
