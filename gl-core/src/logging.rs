//! Structured logging setup using the `tracing` ecosystem.
//!
//! Console output always goes to stderr so that command output on stdout
//! stays machine-readable. File output is optional, rotated daily, and can
//! be written as JSON.

use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::constants::APP_NAME;
use crate::error::GlResult;

/// Where the log filter comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFilter<'a> {
    /// Configured level, overridden by `RUST_LOG` when set.
    Default(&'a str),
    /// Level requested explicitly on the command line. Ignores `RUST_LOG`.
    Forced(&'a str),
}

impl LogFilter<'_> {
    fn level(&self) -> &str {
        match self {
            LogFilter::Default(level) | LogFilter::Forced(level) => level,
        }
    }

    fn build(&self) -> EnvFilter {
        let filter = match self {
            LogFilter::Default(level) => {
                EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))
            }
            LogFilter::Forced(level) => EnvFilter::try_new(level),
        };
        filter.unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Initialize the global tracing subscriber with console and file output.
///
/// # Arguments
/// * `filter` - Log level or filter directive ("trace", "debug", "info", "warn", "error")
///   and whether `RUST_LOG` may override it
/// * `log_dir` - Directory for log files
/// * `json_output` - If true, use JSON format for file output
pub fn init_logging(filter: LogFilter<'_>, log_dir: &Path, json_output: bool) -> GlResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = rolling::daily(log_dir, format!("{APP_NAME}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    if json_output {
        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(filter.build())
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .ok();
    } else {
        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(filter.build())
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .ok();
    }

    tracing::debug!(
        "logging initialized at level={}, dir={}",
        filter.level(),
        log_dir.display()
    );

    Ok(LogGuard { _guard: guard })
}

/// Guard that keeps the non-blocking log writer alive.
/// Drop this to flush and close the log file.
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Initialize a console-only logger on stderr.
pub fn init_console_logging(filter: LogFilter<'_>) {
    let _ = tracing_subscriber::registry()
        .with(filter.build())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init();
}
