//! pcap-report: upload a network capture, run an external analyzer over it and
//! present the resulting datasets as titled tables.
//!
//! The server side stages the upload, runs the analyzer in a per-request
//! working directory and returns a [`ReportPayload`]. The client side submits
//! captures and renders payloads to HTML.

pub mod analysis;
pub mod client;
pub mod config;
pub mod core;
pub mod render;
pub mod report;
pub mod reporting;
pub mod server;
pub mod ui;
pub mod upload;

// Re-export commonly used items
pub use analysis::{AnalysisInvocation, ProcessAnalyzer, RequestScope, RunAnalyzer};
pub use client::ReportClient;
pub use config::{CliConfig, Config};
pub use core::{ReportError, Result};
pub use render::{HtmlReport, RenderedTable, ReportSession, ReportView};
pub use report::{DatasetKind, ReportAssembler, ReportDataset, ReportPayload};
pub use server::ReportPipeline;
pub use upload::{StagingArea, UploadedCapture};
