// src/infra/logger.rs — Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter: `level` for this crate, warnings only for HTTP internals.
pub fn default_filter(level: &str) -> String {
    format!("warn,taxres={level}")
}

/// Install the global subscriber. RUST_LOG, when set, wins over `level`.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
