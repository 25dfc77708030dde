//! Report payload
//!
//! The JSON unit returned for one upload, the fixed dataset vocabulary and
//! the assembler that builds a payload from what the analyzer left on disk.

pub mod assembler;
pub mod kind;
pub mod payload;

// Re-export commonly used items
pub use assembler::ReportAssembler;
pub use kind::DatasetKind;
pub use payload::{ReportDataset, ReportPayload};
