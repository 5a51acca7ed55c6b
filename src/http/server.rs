//! HTTP server setup and dispatch into the capture application.
//!
//! # Responsibilities
//! - Create the Axum router (catch-all: every path is ours)
//! - Wire up middleware (tracing, timeout, request ID)
//! - Buffer and pre-parse request bodies (urlencoded, multipart)
//! - Translate the wire request into transport metadata for the dispatcher
//!
//! # Design Decisions
//! - The body is buffered up front; very-large-body streaming is out of
//!   scope and the limit is enforced before any parsing
//! - Multipart bodies keep an empty raw body: only the reconstructed
//!   form/files representation is stored
//! - TLS presence is what flips the transport's secure flag

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, FromRequest, Multipart, State},
    http::{header, request::Parts, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::app::App;
use crate::capture::files::{UploadedPart, Uploads};
use crate::capture::keypath::insert_pair;
use crate::capture::request::{parse_form, Transport};
use crate::config::CaptureConfig;
use crate::http::request::{RequestId, RequestIdLayer};
use crate::http::response::ApiResponse;
use crate::net::tls::load_tls_config;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
    pub secure: bool,
    pub server_name: Option<String>,
    pub max_body_bytes: usize,
}

/// HTTP server for the capture service.
pub struct HttpServer {
    router: Router,
    config: CaptureConfig,
}

impl HttpServer {
    /// Create a new HTTP server around an assembled application.
    pub fn new(config: CaptureConfig, app: Arc<App>) -> Self {
        let state = AppState {
            app,
            secure: config.listener.tls.is_some(),
            server_name: config.listener.server_name.clone(),
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &CaptureConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(capture_handler))
            .route("/", any(capture_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            tls = self.config.listener.tls.is_some(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        if let Some(tls) = &self.config.listener.tls {
            let rustls_config = load_tls_config(tls).await?;
            let handle = axum_server::Handle::new();

            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown_handle.graceful_shutdown(Some(Duration::from_secs(5)));
            });

            axum_server::from_tcp_rustls(listener.into_std()?, rustls_config)
                .handle(handle)
                .serve(app)
                .await?;
        } else {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

/// Catch-all handler: buffers the body, pre-parses form submissions, and
/// hands the request to the dispatcher.
async fn capture_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();

    let request_id = parts
        .extensions
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = parts.uri.path(),
        "dispatching request"
    );

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(request_id = %request_id, error = %err, "request body too large");
            return ApiResponse::json(
                &json!({"message": "Request body too large"}),
                StatusCode::PAYLOAD_TOO_LARGE,
            )
            .into_response();
        }
    };

    let transport = build_transport(&parts, addr, &state);
    let content_type = header_str(&parts, header::CONTENT_TYPE).unwrap_or_default();

    let mut raw_body = String::new();
    let mut form = Map::new();
    let mut uploads = Uploads::new();

    if content_type.starts_with("multipart/form-data") {
        if let Err(err) = parse_multipart(&parts, bytes, &mut form, &mut uploads).await {
            tracing::debug!(request_id = %request_id, error = %err, "multipart parse failed");
        }
    } else {
        raw_body = String::from_utf8_lossy(&bytes).into_owned();
        if content_type.starts_with("application/x-www-form-urlencoded") {
            form = parse_form(&raw_body);
        }
    }

    state
        .app
        .handle(transport, raw_body, Map::new(), form, uploads)
        .await
        .into_response()
}

fn build_transport(parts: &Parts, addr: SocketAddr, state: &AppState) -> Transport {
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| "/".to_string());

    Transport {
        method: Some(parts.method.to_string()),
        target: Some(target),
        headers: parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        remote_addr: Some(addr.ip().to_string()),
        server_name: state.server_name.clone(),
        secure: state.secure.then(|| "on".to_string()),
        content_type: header_str(parts, header::CONTENT_TYPE),
        content_length: header_str(parts, header::CONTENT_LENGTH),
    }
}

fn header_str(parts: &Parts, name: header::HeaderName) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Walk the multipart body, splitting file parts from text fields. Field
/// names may use bracket syntax for nesting.
async fn parse_multipart(
    parts: &Parts,
    bytes: Bytes,
    form: &mut Map<String, Value>,
    uploads: &mut Uploads,
) -> Result<(), BoxError> {
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .ok_or("missing content type")?;

    let request = Request::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))?;

    let mut multipart = Multipart::from_request(request, &()).await?;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name.is_empty() {
            continue;
        }

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await?;
            uploads.insert_part(
                &name,
                UploadedPart {
                    file_name,
                    content_type,
                    size: data.len() as i64,
                    error: 0,
                },
            );
        } else {
            let text = field.text().await?;
            insert_pair(form, &name, Value::String(text));
        }
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}
