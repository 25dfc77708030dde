//! User interface
//!
//! Command-line parsing for the `pcap-report` binary.

pub mod cli;

// Re-export commonly used items
pub use cli::{Cli, Commands, cli_to_config};
