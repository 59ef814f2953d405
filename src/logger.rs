//! Plain-text diagnostics for batch runs: stderr plus an optional log file,
//! with a per-thread prefix naming the spreadsheet being processed.

use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::io::{Result as IoResult, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
thread_local! {
    static LOG_PREFIX: RefCell<Option<String>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warn => "warning",
            Self::Error => "error",
        })
    }
}

/// Sends diagnostics to `path` in addition to stderr.
///
/// Only the first call takes effect.
///
/// # Errors
///
/// Returns an error if the log file cannot be created.
pub fn set_log_file(path: &Path) -> IoResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let _ = LOG_FILE.set(Mutex::new(file));
    Ok(())
}

/// Prefixes messages logged from this thread until the guard is dropped.
pub fn set_log_prefix(prefix: impl Into<String>) -> LogPrefixGuard {
    let previous = LOG_PREFIX.with(|slot| slot.replace(Some(prefix.into())));
    LogPrefixGuard { previous }
}

/// Restores the previous thread-local prefix on drop.
pub struct LogPrefixGuard {
    previous: Option<String>,
}

impl Drop for LogPrefixGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        LOG_PREFIX.with(|slot| {
            slot.replace(previous);
        });
    }
}

fn prefixed(message: &str) -> String {
    LOG_PREFIX.with(|slot| match slot.borrow().as_deref() {
        Some(prefix) => format!("{prefix}: {message}"),
        None => message.to_owned(),
    })
}

/// Writes `message` to stderr and, when configured, to the log file.
pub fn log(level: Level, message: &str) {
    let message = prefixed(message);
    eprintln!("{level}: {message}");
    if let Some(file) = LOG_FILE.get()
        && let Ok(mut file) = file.lock()
    {
        let stamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let _ = writeln!(file, "{stamp} {level}: {message}");
    }
}

pub fn log_info(message: &str) {
    log(Level::Info, message);
}

pub fn log_warn(message: &str) {
    log(Level::Warn, message);
}

pub fn log_error(message: &str) {
    log(Level::Error, message);
}
