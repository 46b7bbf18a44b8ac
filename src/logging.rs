//! Logging setup for the PAM module
//!
//! Inside a PAM stack the only reliable log sink is syslog, so events are
//! formatted by `tracing-subscriber` and handed to `syslog(3)` one record
//! per event under the auth facility, the way `pam_syslog` reports. An
//! optional append-mode file receives the same events.
//!
//! The subscriber is process-global. It is installed at most once; later
//! calls are no-ops so repeated login attempts in one host process do not
//! fight over it.

use crate::config::LoggingConfig;
use crate::error::{FaceUnlockError, Result};
use std::ffi::CString;
use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, OnceLock};
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Prefix on every syslog record
const SYSLOG_TAG: &str = "pam_faceunlock";

static LOGGING_READY: OnceLock<()> = OnceLock::new();

/// Install the global subscriber described by `config`.
///
/// The filter comes from `config.level` only. The process environment is
/// not consulted, since inside a setuid PAM consumer it belongs to the
/// caller.
///
/// # Errors
///
/// Returns error if the filter is invalid, the log file cannot be opened,
/// or another global subscriber is already installed
pub fn init(config: &LoggingConfig) -> Result<()> {
    if LOGGING_READY.get().is_some() {
        return Ok(());
    }

    let env_filter = level_filter(config)?;

    let syslog_layer = config.syslog.then(|| {
        fmt::layer()
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_writer(Syslog)
    });

    let file_layer = match &config.file_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(FaceUnlockError::Io)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(syslog_layer)
        .with(file_layer)
        .try_init();

    let _ = LOGGING_READY.set(());
    installed.map_err(|e| FaceUnlockError::Logging(e.to_string()).into())
}

/// Filter admitting this crate's events at `config.level` and above.
fn level_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(format!("pam_faceunlock={}", config.level))
        .map_err(|e| FaceUnlockError::Logging(e.to_string()).into())
}

/// `MakeWriter` that turns each formatted event into one syslog record.
#[derive(Debug, Clone, Copy, Default)]
pub struct Syslog;

impl<'a> MakeWriter<'a> for Syslog {
    type Writer = SyslogRecord;

    fn make_writer(&'a self) -> Self::Writer {
        SyslogRecord::new(libc::LOG_INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        SyslogRecord::new(priority_for(meta.level()))
    }
}

/// Map a tracing level to a syslog priority.
pub fn priority_for(level: &Level) -> libc::c_int {
    match *level {
        Level::ERROR => libc::LOG_ERR,
        Level::WARN => libc::LOG_WARNING,
        Level::INFO => libc::LOG_INFO,
        Level::DEBUG | Level::TRACE => libc::LOG_DEBUG,
    }
}

/// Buffer for one event; emitted to syslog when dropped.
#[derive(Debug)]
pub struct SyslogRecord {
    priority: libc::c_int,
    buf: Vec<u8>,
}

impl SyslogRecord {
    fn new(priority: libc::c_int) -> Self {
        Self {
            priority,
            buf: Vec::new(),
        }
    }

    /// The text that will be handed to syslog.
    fn message(&self) -> Option<CString> {
        let text = String::from_utf8_lossy(&self.buf);
        let text = text.trim_end();
        if text.is_empty() {
            return None;
        }
        CString::new(format!("{}: {}", SYSLOG_TAG, text.replace('\0', " "))).ok()
    }
}

impl io::Write for SyslogRecord {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogRecord {
    fn drop(&mut self) {
        if let Some(message) = self.message() {
            // SAFETY: both pointers are valid NUL-terminated strings for the
            // duration of the call and "%s" consumes exactly one argument.
            unsafe {
                libc::syslog(
                    libc::LOG_AUTHPRIV | self.priority,
                    b"%s\0".as_ptr() as *const libc::c_char,
                    message.as_ptr(),
                );
            }
        }
    }
}
