//! Logging and tracing utilities
//!
//! Logging is configured once, explicitly, from a [`LogConfig`]. Three
//! destinations share one line format
//! (`2026-01-05 08:30:00 | INFO  | market_digest::fetcher:42 - message`):
//!
//! - stdout, DEBUG and above
//! - stderr, ERROR and above
//! - an optional size-rotated file, DEBUG and above
//!
//! `RUST_LOG` overrides the configured level. [`routed_subscriber`] builds the
//! same routing over arbitrary writers without installing it.

use crate::rotating::RotatingFileWriter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILE: &str = "logs/app.log";
const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;
const DEFAULT_MAX_BACKUPS: usize = 5;

/// Logging destinations, format and rotation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "debug", "info,reqwest=warn")
    pub level: String,

    /// Log file path; `None` disables file logging
    pub file: Option<PathBuf>,

    /// Size threshold at which the log file rotates
    pub max_file_bytes: u64,

    /// Number of rotated files kept next to the active one
    pub max_backups: usize,

    /// Colored output on the console layers
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_backups: DEFAULT_MAX_BACKUPS,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Config with console output only
    pub fn console_only() -> Self {
        Self {
            file: None,
            ..Self::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

/// Errors raised while installing the global subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be opened
    #[error("Failed to open log file '{}': {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A global subscriber is already installed
    #[error("Failed to install logger: {0}")]
    Init(String),
}

/// Keeps the logging destinations alive; flushes the log file on drop
///
/// Hold it for the lifetime of the process (bind it in `main`).
#[must_use = "dropping the guard flushes and detaches the log file"]
#[derive(Debug)]
pub struct LoggingGuard {
    file: Option<RotatingFileWriter>,
}

impl LoggingGuard {
    /// Path of the active log file, if file logging is enabled
    pub fn log_file(&self) -> Option<PathBuf> {
        self.file.as_ref().map(RotatingFileWriter::path)
    }
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = file.flush();
        }
    }
}

/// Install the process-wide subscriber described by `config`
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard, LoggingError> {
    let file = config
        .file
        .as_ref()
        .map(|path| {
            RotatingFileWriter::new(path, config.max_file_bytes, config.max_backups).map_err(
                |source| LoggingError::File {
                    path: path.clone(),
                    source,
                },
            )
        })
        .transpose()?;

    routed_subscriber(
        config.env_filter(),
        config.ansi,
        io::stdout,
        io::stderr,
        file.clone(),
    )
    .try_init()
    .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LoggingGuard { file })
}

/// The three-destination subscriber behind [`init_logging`], over any writers
///
/// `stdout` receives DEBUG and above, `stderr` ERROR only, `file` (when
/// present) DEBUG and above. `filter` applies to all of them first.
pub fn routed_subscriber<O, E, F>(
    filter: EnvFilter,
    ansi: bool,
    stdout: O,
    stderr: E,
    file: Option<F>,
) -> impl Subscriber + Send + Sync + use<O, E, F>
where
    O: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    E: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let stdout_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(ansi)
        .with_writer(stdout.with_max_level(Level::DEBUG));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(ansi)
        .with_writer(stderr.with_max_level(Level::ERROR));

    let file_layer = file.map(|writer| {
        tracing_subscriber::fmt::layer()
            .event_format(LineFormat)
            .with_ansi(false)
            .with_writer(writer.with_max_level(Level::DEBUG))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(stderr_layer)
        .with(file_layer)
}

/// Build a subscriber that writes the shared line format to `writer`
///
/// Nothing is installed globally; use it with
/// [`tracing::subscriber::with_default`] or [`tracing::subscriber::set_default`]
/// to capture the logs of a scope, e.g. in tests.
pub fn subscriber_with_writer<W>(config: &LogConfig, writer: W) -> impl Subscriber + Send + Sync + use<W>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.level))
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(LineFormat)
                .with_ansi(false)
                .with_writer(writer),
        )
}

/// `timestamp | LEVEL | target:line - spans: message fields`
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "{} | {:<5} | {}:{} - ",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            meta.level(),
            meta.target(),
            meta.line().unwrap_or(0)
        )?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;
                let extensions = span.extensions();
                if let Some(fields) = extensions.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// In-memory log sink, cloneable so a test can keep a handle while the
/// subscriber owns another
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemoryWriter {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for MemoryWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for MemoryWriter {
    type Writer = MemoryWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
