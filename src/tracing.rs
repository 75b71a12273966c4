//! Structured logging setup
//!
//! Logs go to stderr so they never interleave with the conversation on
//! stdout. `RUST_LOG` overrides the default filter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Filter used when `RUST_LOG` is unset: quiet dependencies, our own info events
pub const DEFAULT_LOG_FILTER: &str = "warn,kaizen_agent=info";

/// Initialize the tracing subsystem
///
/// # Arguments
/// * `service_name` - Recorded on the first event so mixed logs can be told apart
/// * `format` - Human-readable text or one JSON object per line
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(
    service_name: &str,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init()?,
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init()?,
    }

    tracing::debug!(service = service_name, ?format, "Tracing initialized");
    Ok(())
}
