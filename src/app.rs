//! Top-level request dispatch.
//!
//! # Data Flow
//! ```text
//! CapturedRequest
//!     → management routes (Pattern Router)
//!     → /api fallthrough: 404 route-not-found
//!     → GET browser navigation: dashboard document
//!     → GET anything else: capture with 200 "OK"
//!     → everything else: capture with 201 "Request captured"
//! ```
//!
//! # Design Decisions
//! - The route table is built once in `App::new` and never mutated
//! - Two pipeline instances share the repository: the default 201 capture
//!   and the lightweight 200 fallback for non-HTML GETs

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Map};

use crate::api::RequestsApi;
use crate::capture::files::Uploads;
use crate::capture::pipeline::{CaptureOptions, CapturePipeline};
use crate::capture::request::{CapturedRequest, Transport};
use crate::config::CaptureSettings;
use crate::http::filter::RequestFilter;
use crate::http::response::ApiResponse;
use crate::routing::{RouteParams, Router};
use crate::storage::RequestRepository;

/// The browser dashboard, embedded at build time.
pub const DASHBOARD_HTML: &str = include_str!("../assets/index.html");

const API_PREFIX: &str = "/api";

/// The assembled service: router, filter and capture pipelines around one
/// repository.
pub struct App {
    router: Router,
    filter: RequestFilter,
    capture: Arc<CapturePipeline>,
    fallback: Arc<CapturePipeline>,
}

impl App {
    pub fn new(repository: Arc<RequestRepository>, settings: &CaptureSettings) -> Self {
        let api = Arc::new(RequestsApi::new(Arc::clone(&repository)));

        let mut router = Router::new();
        {
            let api = Arc::clone(&api);
            router.register("GET", "/api/requests", move |request, _| {
                let api = Arc::clone(&api);
                async move { Some(api.index(&request).await) }
            });
        }
        {
            let api = Arc::clone(&api);
            router.register("GET", "/api/requests/{id}", move |_, params| {
                let api = Arc::clone(&api);
                async move { Some(api.show(param_id(&params)).await) }
            });
        }
        {
            let api = Arc::clone(&api);
            router.register("DELETE", "/api/requests/{id}", move |_, params| {
                let api = Arc::clone(&api);
                async move { Some(api.destroy(param_id(&params)).await) }
            });
        }
        {
            let api = Arc::clone(&api);
            router.register("DELETE", "/api/requests", move |_, _| {
                let api = Arc::clone(&api);
                async move { Some(api.destroy_all().await) }
            });
        }

        let extensions: Vec<&str> = settings
            .ignored_extensions
            .iter()
            .map(String::as_str)
            .collect();
        let filter = RequestFilter::standard().ignore_extensions(&extensions);

        let capture = Arc::new(CapturePipeline::new(
            Arc::clone(&repository),
            CaptureOptions {
                capture_payload: settings.capture_payload,
                ..CaptureOptions::default()
            },
        ));
        let fallback = Arc::new(CapturePipeline::new(
            repository,
            CaptureOptions {
                status: StatusCode::OK,
                message: "OK".to_string(),
                capture_payload: settings.capture_payload,
            },
        ));

        Self {
            router,
            filter,
            capture,
            fallback,
        }
    }

    /// Process one inbound request end to end.
    pub async fn handle(
        &self,
        transport: Transport,
        raw_body: String,
        query_overrides: Map<String, serde_json::Value>,
        form: Map<String, serde_json::Value>,
        files: Uploads,
    ) -> ApiResponse {
        let request = Arc::new(CapturedRequest::from_transport(
            transport,
            raw_body,
            query_overrides,
            form,
            files,
        ));

        if let Some(response) = self.router.dispatch(&request).await {
            return response;
        }

        if request.path().starts_with(API_PREFIX) {
            return ApiResponse::json(
                &json!({"message": "Route not found"}),
                StatusCode::NOT_FOUND,
            );
        }

        if request.method() == "GET" && is_browser_navigation(&request) {
            return ApiResponse::html(DASHBOARD_HTML);
        }

        let pipeline = if request.method() == "GET" {
            &self.fallback
        } else {
            &self.capture
        };

        if !self.filter.should_capture(&request) {
            tracing::debug!(path = request.path(), "request filtered, not captured");
            return ApiResponse::json(
                &json!({"message": pipeline.options().message.as_str()}),
                pipeline.options().status,
            );
        }

        pipeline.respond(&request).await
    }
}

fn param_id(params: &RouteParams) -> i64 {
    params
        .get("id")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

fn is_browser_navigation(request: &CapturedRequest) -> bool {
    let path = request.path();
    if path == "/" || path == "/index.html" {
        return true;
    }

    request
        .header("Accept")
        .is_some_and(|accept| accept.contains("text/html"))
}
