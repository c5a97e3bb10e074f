use std::{path::PathBuf, time::Duration};

use {
    printrelay_common::types::PrinterTarget,
    secrecy::Secret,
    tracing::{debug, info, warn},
};

use crate::{
    error::{ConfigError, Result},
    schema::{
        AuthorizationPolicy, DEFAULT_CONFIRM_TIMEOUT, DEFAULT_DEBUG_PRINTER,
        DEFAULT_PAGE_CONFIRM_LIMIT, Settings, default_work_dir,
    },
};

pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const PRINTER_NAME: &str = "PRINTER_NAME";
pub const DEBUG: &str = "DEBUG";
pub const DEBUG_PRINTER_NAME: &str = "DEBUG_PRINTER_NAME";
pub const ALLOWED_USERS: &str = "ALLOWED_USERS";
pub const PAGE_CONFIRM_LIMIT: &str = "PAGE_CONFIRM_LIMIT";
pub const CONFIRM_TIMEOUT_SECS: &str = "CONFIRM_TIMEOUT_SECS";
pub const WORK_DIR: &str = "PRINTRELAY_WORK_DIR";
pub const CONVERTER_PATH: &str = "CONVERTER_PATH";

/// Load settings from the process environment.
pub fn from_env() -> Result<Settings> {
    from_lookup(|name| std::env::var(name).ok())
}

/// Load settings using a custom variable lookup.
///
/// This is the implementation used by [`from_env`]; the separate signature
/// makes it testable without mutating the process environment.
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Settings> {
    let debug = parse_bool(lookup(DEBUG).as_deref());

    let token = lookup(TELEGRAM_TOKEN)
        .filter(|t| !t.trim().is_empty())
        .ok_or(ConfigError::MissingVar {
            name: TELEGRAM_TOKEN,
        })?;

    let printer = if debug {
        let name = lookup(DEBUG_PRINTER_NAME).unwrap_or_else(|| DEFAULT_DEBUG_PRINTER.into());
        info!(printer = %name, "debug mode: using the debug printer");
        PrinterTarget::from_name(Some(&name))
    } else {
        PrinterTarget::from_name(lookup(PRINTER_NAME).as_deref())
    };

    let allowed_users = match AuthorizationPolicy::parse(lookup(ALLOWED_USERS).as_deref()) {
        AuthorizationPolicy::Malformed { invalid } => {
            return Err(ConfigError::InvalidUserIds { ids: invalid });
        },
        policy => policy,
    };

    let page_confirm_limit = parse_or_default(
        PAGE_CONFIRM_LIMIT,
        lookup(PAGE_CONFIRM_LIMIT),
        DEFAULT_PAGE_CONFIRM_LIMIT,
    );

    let confirm_timeout = match parse_or_default(
        CONFIRM_TIMEOUT_SECS,
        lookup(CONFIRM_TIMEOUT_SECS),
        DEFAULT_CONFIRM_TIMEOUT.as_secs(),
    ) {
        0 => DEFAULT_CONFIRM_TIMEOUT,
        secs => Duration::from_secs(secs),
    };

    let work_dir = lookup(WORK_DIR)
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default_work_dir);

    let converter_path = lookup(CONVERTER_PATH)
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let settings = Settings {
        telegram_token: Secret::new(token),
        debug,
        printer,
        allowed_users,
        page_confirm_limit,
        confirm_timeout,
        work_dir,
        converter_path,
    };
    debug!(?settings, "settings loaded");
    Ok(settings)
}

fn parse_bool(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "t" | "true" | "y" | "yes"
        )
    })
}

fn parse_or_default<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(variable = name, value = %raw, %default, "unparsable value, using default");
            default
        },
    }
}
