//! Logging initialization for the RBAC engine
//!
//! Thin wrapper over tracing-subscriber so embedding services get consistent
//! output. Honors `RUST_LOG`; falls back to the provided default directive.

use tracing_subscriber::EnvFilter;

/// Logging output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output
    Text,
    /// JSON output for log aggregation
    Json,
}

/// Initialize the global tracing subscriber.
///
/// `default_directive` is used when `RUST_LOG` is not set, e.g.
/// `"mealplan_rbac=debug,info"`. Returns quietly if a subscriber is already
/// installed so tests can call it repeatedly.
pub fn init_logging(default_directive: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed, skipping init");
    }
}
