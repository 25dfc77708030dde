//! Upload staging
//!
//! Captures are written to the staging directory under collision-free names
//! before the analyzer sees them.

pub mod staging;

// Re-export commonly used items
pub use staging::{StagedUpload, StagingArea, UploadedCapture};
