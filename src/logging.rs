//! # Structured Logging Module
//!
//! Diagnostic logging for check runs. Everything goes to stderr because stdout
//! carries the single plugin output line that the monitoring system parses.

use crate::constants::CheckStatus;
use chrono::Utc;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Log line encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?} (expected text or json)")),
        }
    }
}

/// Initialize logging once per process
///
/// `RUST_LOG` wins when set; otherwise the level follows the `-v` count.
pub fn init_logging(verbosity: u8, format: LogFormat) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

        let layer = match format {
            LogFormat::Text => fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .with_ansi(false)
                .with_filter(filter)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json()
                .with_filter(filter)
                .boxed(),
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized, keeping the existing one"
            );
        }

        tracing::debug!(
            pid = std::process::id(),
            verbosity = verbosity,
            format = ?format,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Map the `-v` count to a filter directive
fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Log structured data for one tube probe
pub fn log_probe_operation(
    tube: &str,
    age_seconds: Option<f64>,
    status: CheckStatus,
    details: Option<&str>,
) {
    tracing::info!(
        tube = %tube,
        age_seconds = age_seconds,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 PROBE_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
