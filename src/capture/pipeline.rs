//! Capture pipeline: URL reconstruction, body reconciliation, persistence.
//!
//! # Responsibilities
//! - Resolve scheme and host to rebuild the absolute URL
//! - Reconcile the body representation (raw body vs. reconstructed
//!   form+files JSON)
//! - Write the capture record and wrap it in the configured response
//!
//! # Design Decisions
//! - A write failure is a hard error for the request; there is no retry
//!   and no partially-persisted record
//! - With `capture_payload` off, body/form/files are forced empty; this is
//!   the lightweight mode for HEAD-like probes

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::capture::files;
use crate::capture::request::CapturedRequest;
use crate::http::response::ApiResponse;
use crate::observability::metrics;
use crate::storage::{CaptureRecord, NewCapture, RequestRepository, StorageError};

/// Response/behavior knobs for one pipeline instance.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub status: StatusCode,
    pub message: String,
    pub capture_payload: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            status: StatusCode::CREATED,
            message: "Request captured".to_string(),
            capture_payload: true,
        }
    }
}

pub struct CapturePipeline {
    repository: Arc<RequestRepository>,
    options: CaptureOptions,
}

impl CapturePipeline {
    pub fn new(repository: Arc<RequestRepository>, options: CaptureOptions) -> Self {
        Self {
            repository,
            options,
        }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Persist the request as a capture record.
    pub async fn store(&self, request: &CapturedRequest) -> Result<CaptureRecord, StorageError> {
        let scheme = detect_scheme(request);
        let host = request
            .header("Host")
            .map(str::to_string)
            .or_else(|| request.transport().server_name.clone())
            .unwrap_or_else(|| "localhost".to_string());
        let full_url = format!("{scheme}://{host}{}", request.target());

        let (body, form_data, files) = self.resolve_payload(request);

        self.repository
            .store(NewCapture {
                method: request.method().to_string(),
                path: request.path().to_string(),
                full_url,
                query_params: Value::Object(request.query().clone()),
                headers: Value::Object(request.headers().clone()),
                body,
                form_data,
                files,
                client_ip: request.client_ip().to_string(),
                created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            })
            .await
    }

    /// Persist and wrap in the configured response envelope.
    pub async fn respond(&self, request: &CapturedRequest) -> ApiResponse {
        let start = Instant::now();
        match self.store(request).await {
            Ok(record) => {
                metrics::record_capture(request.method(), self.options.status.as_u16(), start);
                ApiResponse::json(
                    &json!({"message": self.options.message.as_str(), "data": record}),
                    self.options.status,
                )
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    method = request.method(),
                    path = request.path(),
                    "failed to persist capture record"
                );
                metrics::record_capture(request.method(), 500, start);
                ApiResponse::json(
                    &json!({"message": "Failed to persist request"}),
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
            }
        }
    }

    /// Raw body when present; otherwise a pretty-printed `{form, files}`
    /// reconstruction when either is non-empty; otherwise empty.
    fn resolve_payload(&self, request: &CapturedRequest) -> (String, Value, Value) {
        if !self.options.capture_payload {
            let empty = || Value::Object(Map::new());
            return (String::new(), empty(), empty());
        }

        let form_data = Value::Object(request.form().clone());
        let files = files::to_value(request.files());

        let body = if !request.body().is_empty() {
            request.body().to_string()
        } else if !request.form().is_empty() || !request.files().is_empty() {
            let reconstructed = json!({"form": form_data, "files": files});
            serde_json::to_string_pretty(&reconstructed).unwrap_or_else(|_| "{}".to_string())
        } else {
            String::new()
        };

        (body, form_data, files)
    }
}

/// `https` when the transport says the connection was secure, else any
/// forwarded protocol, else `http`.
fn detect_scheme(request: &CapturedRequest) -> String {
    if let Some(flag) = &request.transport().secure {
        if matches!(flag.to_lowercase().as_str(), "on" | "1" | "true") {
            return "https".to_string();
        }
    }

    if let Some(proto) = request.header("X-Forwarded-Proto") {
        if !proto.is_empty() {
            return proto.to_lowercase();
        }
    }

    "http".to_string()
}
