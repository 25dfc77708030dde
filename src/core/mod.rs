//! Core types and foundational components
//!
//! This module contains the error type and the constants shared by the
//! server, the analyzer runner and the renderer.

pub mod constants;
pub mod error;

// Re-export commonly used items for convenience
pub use error::{ReportError, Result};
