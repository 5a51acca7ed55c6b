//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the capture
//! service. All types derive Serde traits for deserialization from config
//! files, and every field has a default so a minimal config is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for the capture service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CaptureConfig {
    /// Listener configuration (bind address, TLS, limits).
    pub listener: ListenerConfig,

    /// SQLite storage settings.
    pub storage: StorageConfig,

    /// Capture behavior knobs.
    pub capture: CaptureSettings,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Maximum buffered request body size, in bytes.
    pub max_body_bytes: usize,

    /// Server name used for URL reconstruction when no Host header arrives.
    pub server_name: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_connections: 10_000,
            max_body_bytes: 1024 * 1024,
            server_name: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// SQLite storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the database file; parent directories are created on open.
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "storage/httpcapture.sqlite".to_string(),
        }
    }
}

/// Capture behavior knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// When false, body/form/files are dropped from stored records.
    pub capture_payload: bool,

    /// Path extensions excluded from capture, in addition to the stock
    /// noise-path denylist.
    pub ignored_extensions: Vec<String>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            capture_payload: true,
            ignored_extensions: Vec::new(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout enforced by the transport layer.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Bind address of the metrics exporter.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let config = CaptureConfig::default();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.listener.tls.is_none());
        assert!(config.capture.capture_payload);
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_minimal_toml_round_trip() {
        let config: CaptureConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [capture]
            ignored_extensions = ["png", "css"]
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.capture.ignored_extensions, ["png", "css"]);
        // Unspecified sections fall back to defaults.
        assert_eq!(config.storage.database_path, "storage/httpcapture.sqlite");
    }
}
