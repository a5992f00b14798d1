//! # Logging
//!
//! The library emits `tracing` events: `debug!` when tables are rebuilt and
//! catalogs indexed, `warn!` for out-of-range channels and skipped gates, and
//! `trace!` from the statistics path. Applications that have no subscriber of
//! their own can install one from a [`LogConfig`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use spectcl_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
//!
//! let config = LogConfig {
//!     level: LogLevel::Debug,
//!     format: LogFormat::Json,
//!     ..Default::default()
//! };
//! init_logging(&config);
//!
//! tracing::info!(spectra = 12, "catalog loaded");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{prelude::*, EnvFilter, Layer, Registry};

/// Minimum level of events that reach the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-line, human readable
    #[default]
    Pretty,
    /// One line per event
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Include file and line of the event
    pub source_location: bool,
    pub thread_ids: bool,
    pub thread_names: bool,
    /// Emit span enter/exit events
    pub span_events: bool,
    /// Directive string such as `"spectcl_core=trace"`; overrides `level`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            source_location: false,
            thread_ids: false,
            thread_names: false,
            span_events: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Verbose, pretty, with source locations.
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            source_location: true,
            thread_names: true,
            span_events: true,
            ..Default::default()
        }
    }

    /// Info level as JSON.
    pub fn production() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            ..Default::default()
        }
    }

    /// Errors only.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::Compact,
            ..Default::default()
        }
    }

    /// Filter for this configuration.
    ///
    /// An explicit `filter` wins; otherwise `RUST_LOG`, then `level`.
    pub fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.to_string());
        match &self.filter {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.span_events {
            FmtSpan::FULL
        } else {
            FmtSpan::NONE
        };
        let layer = tracing_subscriber::fmt::layer()
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_thread_ids(self.thread_ids)
            .with_thread_names(self.thread_names)
            .with_span_events(span_events);

        match self.format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        }
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a global subscriber was already set, in which case the
/// call has no effect.
pub fn init_logging(config: &LogConfig) -> bool {
    let subscriber = tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(config.env_filter());
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
