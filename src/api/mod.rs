//! Management API subsystem.

pub mod handlers;

pub use handlers::RequestsApi;
