//! Upload client
//!
//! Submits captures to a running server and feeds the returned payload to a
//! [`crate::render::ReportSession`].

pub mod submitter;

// Re-export commonly used items
pub use submitter::ReportClient;
