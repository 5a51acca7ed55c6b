//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the logging subsystem
//! - Configure the filter at runtime via `RUST_LOG`
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Default directive keeps the capture path and tower-http visible

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber. Call once at startup.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "httpcapture=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
