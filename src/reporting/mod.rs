//! Operational reporting
//!
//! Structured logging for the server and the command line tools.

pub mod logging;
