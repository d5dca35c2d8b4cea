//! Logging setup for applications embedding gateway adapters.
//!
//! The library itself only emits `tracing` spans and events (audit events use
//! the `audit` target). Installing a subscriber is left to the application;
//! [`init_observability`] is a ready-made one.

use std::io;

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{GatewayError, Result};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for development.
    #[default]
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

impl LogFormat {
    /// Reads the format from the `LOG_FORMAT` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT").map_or_else(|_| Self::default(), |name| Self::from_name(&name))
    }

    /// `json` (any case) selects [`LogFormat::Json`]; anything else is
    /// [`LogFormat::Pretty`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("json") { Self::Json } else { Self::Pretty }
    }
}

/// Installs a global `tracing` subscriber writing to stderr.
///
/// The level filter comes from `RUST_LOG` and defaults to `info`.
///
/// # Errors
///
/// Returns [`GatewayError::ConfigError`] if a global subscriber is already
/// installed.
///
/// # Examples
///
/// ```no_run
/// use paygate::observability::{LogFormat, init_observability};
///
/// init_observability(LogFormat::from_env()).expect("no subscriber installed yet");
/// ```
pub fn init_observability(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Pretty => subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|e| GatewayError::ConfigError(format!("logging already initialized: {e}")))
}
