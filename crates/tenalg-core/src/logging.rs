//! Structured logging setup
//!
//! The kernels emit `tracing` events: dispatch decisions and cache evictions
//! at `debug`, cache hits and sparse normalisation at `trace`. Nothing is
//! printed unless the application installs a subscriber, either its own or
//! the one built by [`init_logging`] (feature `logging`).
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directive (default `tenalg=info,warn`)
//! - `TENALG_LOG_FORMAT`: `pretty`, `compact` or `json` (default `pretty`)
//!
//! # Example
//!
//! ```ignore
//! use tenalg_core::logging::{init_logging, LogConfig, LogFormat};
//!
//! init_logging(&LogConfig {
//!     format: LogFormat::Compact,
//!     filter: "tenalg_core=debug".to_string(),
//!     ..LogConfig::default()
//! })?;
//! ```

#[cfg(feature = "logging")]
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// One line per event
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl LogFormat {
    /// Parse a format name; unknown names fall back to `Pretty`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Subscriber settings for [`init_logging`]
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `tenalg_core=debug,info`
    pub filter: String,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        let format = std::env::var("TENALG_LOG_FORMAT")
            .map(|s| LogFormat::parse(&s))
            .unwrap_or(LogFormat::Pretty);
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "tenalg=info,warn".to_string());

        Self {
            format,
            filter,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
        }
    }
}

/// Install a global `tracing` subscriber.
///
/// # Errors
///
/// Fails if the filter directive does not parse or a global subscriber is
/// already installed.
#[cfg(feature = "logging")]
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.filter)?;

    match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
    }

    tracing::debug!(format = ?config.format, filter = %config.filter, "logging initialised");
    Ok(())
}

/// Without the `logging` feature the application owns the subscriber.
#[cfg(not(feature = "logging"))]
pub fn init_logging(_config: &LogConfig) -> anyhow::Result<()> {
    Ok(())
}
