//! Request normalization.
//!
//! # Responsibilities
//! - Build the canonical request value from raw transport input
//! - Canonicalize header names to Title-Case-With-Hyphens
//! - Resolve the originating client address
//! - Parse and merge query parameters
//!
//! # Design Decisions
//! - Transport metadata is all-optional; every derived field has an explicit
//!   default so no key is ever assumed present
//! - Client-IP resolution trusts `X-Forwarded-For`/`Cf-Connecting-Ip`
//!   unconditionally. That is the right call behind a trusted proxy or CDN
//!   and spoofable everywhere else; known limitation, kept for parity with
//!   existing deployments
//! - The original transport metadata is retained on the request because
//!   scheme/host detection happens later, in the capture pipeline

use indexmap::IndexMap;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::capture::files::{FileNode, Uploads};
use crate::capture::keypath::insert_pair;

/// Raw transport-level metadata for one inbound request, as reported by the
/// listener. Every field may be absent.
#[derive(Debug, Clone, Default)]
pub struct Transport {
    /// HTTP method as received.
    pub method: Option<String>,
    /// Original request-target (path plus query string).
    pub target: Option<String>,
    /// Header name/value pairs in arrival order, any case, duplicates kept.
    pub headers: Vec<(String, String)>,
    /// Peer address of the connection.
    pub remote_addr: Option<String>,
    /// Configured server name, if any.
    pub server_name: Option<String>,
    /// TLS indicator; truthy values are `on`, `1` and `true` (any case).
    pub secure: Option<String>,
    /// Content type as a distinguished transport field.
    pub content_type: Option<String>,
    /// Content length as a distinguished transport field.
    pub content_length: Option<String>,
}

/// The canonical, immutable request value consumed by the router, filter and
/// capture pipeline.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    method: String,
    target: String,
    path: String,
    query: Map<String, Value>,
    headers: Map<String, Value>,
    body: String,
    form: Map<String, Value>,
    files: IndexMap<String, FileNode>,
    client_ip: String,
    transport: Transport,
}

impl CapturedRequest {
    /// Normalize raw transport input. `query_overrides` are merged over the
    /// parsed query string, overrides winning on key collision.
    pub fn from_transport(
        transport: Transport,
        raw_body: String,
        query_overrides: Map<String, Value>,
        form: Map<String, Value>,
        files: Uploads,
    ) -> Self {
        let method = transport
            .method
            .as_deref()
            .unwrap_or("GET")
            .to_uppercase();
        let target = transport.target.clone().unwrap_or_else(|| "/".to_string());
        let (path, query_string) = split_target(&target);

        let mut query = parse_query(query_string);
        for (key, value) in query_overrides {
            query.insert(key, value);
        }

        let headers = canonical_headers(&transport);
        let client_ip = resolve_client_ip(&transport, &headers);
        let files = files.normalize();

        Self {
            method,
            target,
            path,
            query,
            headers,
            body: raw_body,
            form,
            files,
            client_ip,
            transport,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The original request-target, path plus query string.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Decoded path component, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    pub fn headers(&self) -> &Map<String, Value> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn form(&self) -> &Map<String, Value> {
        &self.form
    }

    pub fn files(&self) -> &IndexMap<String, FileNode> {
        &self.files
    }

    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

/// Split a request-target into decoded path and raw query string.
fn split_target(target: &str) -> (String, &str) {
    let (raw_path, query) = match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    };

    let path = match urlencoding::decode(raw_path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw_path.to_string(),
    };
    let path = if path.is_empty() { "/".to_string() } else { path };

    (path, query)
}

/// Decode a query string into a mapping. Bracketed keys build nested
/// structures; duplicate scalar keys keep the last value.
pub fn parse_query(query: &str) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        insert_pair(&mut map, &key, Value::String(value.into_owned()));
    }
    map
}

/// Decode an `application/x-www-form-urlencoded` body into form fields.
pub fn parse_form(body: &str) -> Map<String, Value> {
    parse_query(body)
}

/// `x-forwarded-for` / `X_FORWARDED_FOR` → `X-Forwarded-For`.
pub fn canonical_header_name(name: &str) -> String {
    name.split(['-', '_'])
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn canonical_headers(transport: &Transport) -> Map<String, Value> {
    let mut headers = Map::new();
    for (name, value) in &transport.headers {
        headers.insert(
            canonical_header_name(name),
            Value::String(value.clone()),
        );
    }

    if let Some(content_type) = &transport.content_type {
        headers.insert(
            "Content-Type".to_string(),
            Value::String(content_type.clone()),
        );
    }
    if let Some(content_length) = &transport.content_length {
        headers.insert(
            "Content-Length".to_string(),
            Value::String(content_length.clone()),
        );
    }

    headers
}

/// Priority order: forwarding headers, CDN header, peer address, `0.0.0.0`.
fn resolve_client_ip(transport: &Transport, headers: &Map<String, Value>) -> String {
    let forwarded = headers
        .get("X-Forwarded-For")
        .or_else(|| headers.get("Forwarded"))
        .and_then(Value::as_str)
        .unwrap_or("");

    let first = forwarded.split(',').next().unwrap_or("").trim();
    if !first.is_empty() {
        return first.to_string();
    }

    if let Some(ip) = headers.get("Cf-Connecting-Ip").and_then(Value::as_str) {
        if !ip.is_empty() {
            return ip.to_string();
        }
    }

    transport
        .remote_addr
        .clone()
        .unwrap_or_else(|| "0.0.0.0".to_string())
}
