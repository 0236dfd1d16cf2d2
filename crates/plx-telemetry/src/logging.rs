//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing targets are crate names with underscores.
const DEFAULT_FILTER: &str = "info,plx_core=debug,plx_feed=debug,plx_ws=debug,plx_telemetry=debug";

/// Initialize structured logging.
///
/// Configures tracing with JSON output when `RUST_ENV=production` and
/// pretty output otherwise. `RUST_LOG` overrides the default filter.
/// A second call fails with `LoggingInit` instead of panicking.
pub fn init_logging() -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let is_production = std::env::var("RUST_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let result = if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_names(true),
            )
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_targets_workspace_crates() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
        for target in [module_path!(), "plx_feed", "plx_ws"] {
            let crate_name = target.split("::").next().unwrap();
            assert!(
                DEFAULT_FILTER.contains(&format!("{crate_name}=debug")),
                "{crate_name} missing from default filter"
            );
        }
    }

    #[test]
    fn test_second_init_is_an_error() {
        // The first call may race with another test installing a subscriber,
        // so only the second call is asserted.
        let _ = init_logging();
        let second = init_logging();
        assert!(matches!(second, Err(TelemetryError::LoggingInit(_))));
    }
}
