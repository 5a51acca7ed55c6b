//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, body buffering, form/multipart pre-parse)
//!     → request.rs (request ID middleware)
//!     → app (dispatcher: routes, dashboard, capture)
//!     → response.rs (envelope rendered to the client)
//! ```

pub mod filter;
pub mod request;
pub mod response;
pub mod server;

pub use filter::RequestFilter;
pub use request::{RequestId, RequestIdLayer, X_REQUEST_ID};
pub use response::ApiResponse;
pub use server::HttpServer;
