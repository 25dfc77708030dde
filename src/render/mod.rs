//! Report rendering
//!
//! Turns a payload into titled tables and images, keeps track of what is on
//! display, and writes it out as a static HTML page.

pub mod html;
pub mod table;
pub mod view;

// Re-export commonly used items
pub use html::{HtmlReport, escape_html, resolve_image};
pub use table::{RenderedTable, parse_dataset};
pub use view::{ReportSession, ReportView};
