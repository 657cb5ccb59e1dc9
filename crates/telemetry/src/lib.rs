//! Logging bootstrap for Booker binaries.

use booker_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` wins, otherwise the configured level.
fn env_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global tracing subscriber.
///
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place and report it at debug level.
pub fn init(settings: &TelemetrySettings) {
    let registry = tracing_subscriber::registry().with(env_filter(settings));

    let result = match settings.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    match result {
        Ok(()) => tracing::info!(
            target: "booker-telemetry",
            format = ?settings.log_format,
            "tracing initialized"
        ),
        Err(e) => tracing::debug!(
            target: "booker-telemetry",
            error = %e,
            "tracing already initialized"
        ),
    }
}
