//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: CaptureConfig → Result<(), Vec<...>>
//! - Runs before a config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::CaptureConfig;

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration for semantic problems, collecting every error.
pub fn validate_config(config: &CaptureConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address".to_string(),
            message: format!("not a valid socket address: {}", config.listener.bind_address),
        });
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError {
            field: "listener.max_connections".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError {
            field: "listener.max_body_bytes".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError {
                field: "listener.tls.cert_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError {
                field: "listener.tls.key_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
    }

    if config.storage.database_path.is_empty() {
        errors.push(ValidationError {
            field: "storage.database_path".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.request_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address".to_string(),
            message: format!(
                "not a valid socket address: {}",
                config.observability.metrics_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
