//! Logging initialization, adapted from `bog-core/src/utils/logger.rs`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber. `json_logs` switches between a
/// machine-readable layer (for batch backtest runs piped into a report
/// generator) and a human-readable one (for interactive use).
pub fn init_logger(log_level: &str, json_logs: bool) {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .init();
    }
}
