//! Routing subsystem for the management API.
//!
//! # Data Flow
//! ```text
//! Incoming CapturedRequest (method, path)
//!     → router.rs (ordered route table)
//!     → pattern.rs (segment matching, placeholder extraction)
//!     → Return: handler response or explicit no-match
//!
//! Route Compilation (at startup):
//!     method + template strings
//!     → Compile segment matchers and placeholder names
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in the hot path (segment matching only)
//! - First match wins, in registration order
//! - Captured traffic is never pattern-matched; only the management API is

pub mod pattern;
pub mod router;

pub use pattern::{RouteParams, RoutePattern};
pub use router::Router;
