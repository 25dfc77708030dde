// Command-line interface definitions and parsing for pcap-report

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::CliConfig;
use crate::core::constants::timeouts;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_REPORT_FILE: &str = "report.html";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // Server
    /// Address to listen on (default: 127.0.0.1)
    #[arg(long, value_name = "ADDR", global = true, help_heading = "Server")]
    pub bind: Option<String>,

    /// Port to listen on (default: 3000)
    #[arg(short = 'p', long, value_name = "PORT", global = true, help_heading = "Server")]
    pub port: Option<u16>,

    /// Static files served at / (default: public)
    #[arg(long, value_name = "DIR", global = true, help_heading = "Server")]
    pub public_dir: Option<String>,

    /// Where generated images are published (default: graphs)
    #[arg(long, value_name = "DIR", global = true, help_heading = "Server")]
    pub graphs_dir: Option<String>,

    /// Where uploaded captures are staged (default: uploads)
    #[arg(long, value_name = "DIR", global = true, help_heading = "Server")]
    pub uploads_dir: Option<String>,

    /// Root of the per-request analyzer directories (default: work)
    #[arg(long, value_name = "DIR", global = true, help_heading = "Server")]
    pub work_dir: Option<String>,

    /// Reject uploads larger than this many bytes
    #[arg(long, value_name = "BYTES", global = true, help_heading = "Server")]
    pub max_upload_bytes: Option<usize>,

    // Analyzer
    /// Analyzer executable (default: python)
    #[arg(long, value_name = "PROGRAM", global = true, help_heading = "Analyzer")]
    pub analyzer: Option<String>,

    /// Argument placed before the capture path; repeat for several (default: main.py)
    #[arg(
        long,
        value_name = "ARG",
        global = true,
        allow_hyphen_values = true,
        help_heading = "Analyzer"
    )]
    pub analyzer_arg: Vec<String>,

    /// Analyzer time limit in seconds (default: 300)
    #[arg(short = 't', long, value_name = "SECONDS", global = true, help_heading = "Analyzer")]
    pub timeout: Option<u64>,

    /// Port-scan threshold passed to the analyzer
    #[arg(long, value_name = "COUNT", global = true, help_heading = "Analyzer")]
    pub port_scan_threshold: Option<u32>,

    /// Delete staged captures once the report is built
    #[arg(long, global = true, help_heading = "Analyzer")]
    pub discard_uploads: bool,

    /// Keep per-request analyzer directories
    #[arg(long, global = true, help_heading = "Analyzer")]
    pub retain_artifacts: bool,

    // Output & Verbosity
    /// Suppress log output
    #[arg(short = 'q', long, global = true, help_heading = "Output & Verbosity")]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true, help_heading = "Output & Verbosity")]
    pub verbose: bool,

    // Configuration
    /// Use specific config file
    #[arg(long, value_name = "FILE", global = true, help_heading = "Configuration")]
    pub config: Option<String>,

    /// Ignore config files
    #[arg(long, global = true, help_heading = "Configuration")]
    pub no_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Upload a capture to a running server and write the report
    Submit {
        /// Capture file to upload
        capture: PathBuf,

        /// Server base URL
        #[arg(long, value_name = "URL", default_value = DEFAULT_SERVER_URL)]
        server: String,

        /// Where to write the HTML report
        #[arg(short = 'o', long, value_name = "PATH", default_value = DEFAULT_REPORT_FILE)]
        output: PathBuf,

        /// How long to wait for the server, in seconds (default: 600)
        #[arg(long, value_name = "SECONDS")]
        request_timeout: Option<u64>,
    },
    /// Render a saved JSON payload to HTML
    Render {
        /// Payload file as returned by POST /upload-pcap
        payload: PathBuf,

        /// Where to write the HTML report
        #[arg(short = 'o', long, value_name = "PATH", default_value = DEFAULT_REPORT_FILE)]
        output: PathBuf,

        /// Prefix for relative image references, e.g. the server URL
        #[arg(long, value_name = "URL", default_value = "")]
        image_base: String,
    },
    /// Run the analyzer locally and write the report, without a server
    Analyze {
        /// Capture file to analyze
        capture: PathBuf,

        /// Where to write the HTML report
        #[arg(short = 'o', long, value_name = "PATH", default_value = DEFAULT_REPORT_FILE)]
        output: PathBuf,
    },
}

/// Client request timeout for `submit`, in seconds
pub fn request_timeout_seconds(requested: Option<u64>) -> u64 {
    requested.unwrap_or(timeouts::DEFAULT_CLIENT_TIMEOUT_SECONDS)
}

/// Collect the server and analyzer flags into a CliConfig
pub fn cli_to_config(cli: &Cli) -> CliConfig {
    CliConfig {
        bind: cli.bind.clone(),
        port: cli.port,
        public_dir: cli.public_dir.clone(),
        graphs_dir: cli.graphs_dir.clone(),
        uploads_dir: cli.uploads_dir.clone(),
        work_dir: cli.work_dir.clone(),
        analyzer_program: cli.analyzer.clone(),
        analyzer_args: if cli.analyzer_arg.is_empty() {
            None
        } else {
            Some(cli.analyzer_arg.clone())
        },
        analyzer_timeout: cli.timeout,
        port_scan_threshold: cli.port_scan_threshold,
        discard_uploads: cli.discard_uploads,
        retain_artifacts: cli.retain_artifacts,
        max_upload_bytes: cli.max_upload_bytes,
        quiet: cli.quiet,
        verbose: cli.verbose,
        config_file: cli.config.clone(),
        no_config: cli.no_config,
    }
}
