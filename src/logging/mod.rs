//! Subscriber setup.
//!
//! `APP_ENV=production` (or `prod`) emits one JSON object per event for log
//! shippers; any other environment gets coloured human-readable lines.
//! `RUST_LOG` overrides the default `info` filter in both.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::get_environment;

const DEFAULT_FILTER: &str = "info";

pub fn is_production(env: &str) -> bool {
    matches!(env.trim().to_ascii_lowercase().as_str(), "production" | "prod")
}

/// Install the global subscriber. Later calls are ignored, so tests and the
/// binary can both call it.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if is_production(&get_environment()) {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(true),
            )
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
