//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Look up the first route matching method and full path
//! - Return the handler response, or an explicit no-match
//!
//! # Design Decisions
//! - Route table is built once at startup and never mutated afterwards
//! - First match wins; a handler may decline and dispatch continues
//! - Explicit `None` on no match so the dispatcher can fall through

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::capture::request::CapturedRequest;
use crate::http::response::ApiResponse;
use crate::routing::pattern::{RouteParams, RoutePattern};

type BoxedHandler = Box<
    dyn Fn(Arc<CapturedRequest>, RouteParams) -> BoxFuture<'static, Option<ApiResponse>>
        + Send
        + Sync,
>;

struct Route {
    method: String,
    pattern: RoutePattern,
    handler: BoxedHandler,
}

/// An ordered table of compiled routes.
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a handler for `method` + `template`. The handler receives
    /// the request and the extracted placeholder values; returning `None`
    /// declines the match and dispatch moves on to later routes.
    pub fn register<F, Fut>(&mut self, method: &str, template: &str, handler: F)
    where
        F: Fn(Arc<CapturedRequest>, RouteParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<ApiResponse>> + Send + 'static,
    {
        self.routes.push(Route {
            method: method.to_uppercase(),
            pattern: RoutePattern::compile(template),
            handler: Box::new(move |request, params| Box::pin(handler(request, params))),
        });
    }

    /// Try routes in registration order. `None` means no route produced a
    /// response and the caller should fall through to capture/UI logic.
    pub async fn dispatch(&self, request: &Arc<CapturedRequest>) -> Option<ApiResponse> {
        for route in &self.routes {
            if route.method != request.method() {
                continue;
            }
            let Some(params) = route.pattern.matches(request.path()) else {
                continue;
            };

            tracing::debug!(
                method = %route.method,
                template = route.pattern.template(),
                "route matched"
            );

            if let Some(response) = (route.handler)(Arc::clone(request), params).await {
                return Some(response);
            }
        }

        None
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
