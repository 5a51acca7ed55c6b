//! Response envelope produced by the dispatcher and handlers.
//!
//! # Responsibilities
//! - Carry status, content type and rendered body to the transport layer
//! - JSON and HTML constructors
//!
//! # Design Decisions
//! - Body is rendered eagerly; every response in this service is small
//! - A JSON encoding failure degrades to a 500 envelope instead of a panic

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// A fully rendered response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

impl ApiResponse {
    pub fn json<T: Serialize>(value: &T, status: StatusCode) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(err) => {
                tracing::error!(error = %err, "failed to encode JSON response");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    content_type: "application/json",
                    body: r#"{"message":"Response encoding failed"}"#.to_string(),
                }
            }
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/html; charset=utf-8",
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response()
    }
}
