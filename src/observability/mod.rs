//! Cross-cutting observability: structured logging and metrics.

pub mod logging;
pub mod metrics;
