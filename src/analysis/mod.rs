//! External analyzer orchestration
//!
//! This module builds the analyzer command line, runs it as a bounded
//! child process and owns the per-request directory it writes into.

pub mod invocation;
pub mod runner;
pub mod scope;

// Re-export commonly used items
pub use invocation::{AnalysisInvocation, AnalyzerSettings};
pub use runner::{AnalysisOutcome, ProcessAnalyzer, RunAnalyzer};
pub use scope::RequestScope;
