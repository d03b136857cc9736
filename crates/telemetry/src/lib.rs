//! Tracing subscriber bootstrap.

use bookman_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Fails if a global subscriber
/// is already installed or the filter directive does not parse.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = build_filter(settings)?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::info!(
        target: "bookman-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

fn build_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.filter)
            .map_err(|e| anyhow::anyhow!("invalid log filter '{}': {e}", settings.filter)),
    }
}
