//! Request normalization and the capture pipeline.
//!
//! # Data Flow
//! ```text
//! Transport metadata + raw body + parsed form/files
//!     → request.rs (canonical CapturedRequest)
//!     → pipeline.rs (scheme/host, body reconciliation)
//!     → storage (persisted CaptureRecord)
//! ```

pub mod files;
pub mod keypath;
pub mod pipeline;
pub mod request;

pub use files::{FileInfo, FileNode, UploadField, UploadedPart, Uploads};
pub use pipeline::{CaptureOptions, CapturePipeline};
pub use request::{CapturedRequest, Transport};
