/// Application-wide constants to avoid magic values throughout the codebase.
///
/// Everything the analyzer contract, the HTTP surface and the renderer agree
/// on lives here so the three sides cannot drift apart.
/// Dataset file names the analyzer is asked to produce
pub mod datasets {
    /// Protocol share of all IP packets
    pub const PROTOCOL_DISTRIBUTION: &str = "protocol_distribution.csv";
    /// Packet counts per source/destination pair
    pub const TOP_IP_COMMUNICATIONS: &str = "top_ip_communications.csv";
    /// Protocol share per source/destination pair
    pub const SHARE_OF_PROTOCOL_BETWEEN_IPS: &str = "share_of_protocol_between_ips.csv";
    /// DNS queries seen in the capture
    pub const DNS_REQUESTS: &str = "dns_requests.csv";

    /// Outputs requested from the analyzer when nothing else is configured, in order
    pub const DEFAULT_OUTPUTS: [&str; 3] = [
        PROTOCOL_DISTRIBUTION,
        TOP_IP_COMMUNICATIONS,
        SHARE_OF_PROTOCOL_BETWEEN_IPS,
    ];
}

/// HTTP surface constants
pub mod http {
    /// Upload endpoint returning the JSON payload
    pub const UPLOAD_ROUTE: &str = "/upload-pcap";
    /// Upload endpoint returning the rendered HTML report
    pub const UPLOAD_REPORT_ROUTE: &str = "/upload-pcap/report";
    /// URL prefix for generated images
    pub const GRAPHS_ROUTE: &str = "/graphs";
    /// Multipart field carrying the capture
    pub const CAPTURE_FIELD: &str = "pcapfile";
    /// Default listen address
    pub const DEFAULT_BIND: &str = "127.0.0.1";
    /// Default listen port
    pub const DEFAULT_PORT: u16 = 3000;
}

/// Timeout and duration constants
pub mod timeouts {
    /// Default bound on a single analyzer run, in seconds
    pub const DEFAULT_ANALYZER_TIMEOUT_SECONDS: u64 = 300;
    /// Largest analyzer timeout accepted by config validation (24 hours)
    pub const MAX_ANALYZER_TIMEOUT_SECONDS: u64 = 86_400;
    /// Default client request timeout, in seconds
    pub const DEFAULT_CLIENT_TIMEOUT_SECONDS: u64 = 600;
}

/// Filesystem layout defaults
pub mod paths {
    /// Static page assets
    pub const PUBLIC_DIR: &str = "public";
    /// Root for per-request copies of generated images
    pub const GRAPHS_DIR: &str = "graphs";
    /// Staged uploads
    pub const UPLOADS_DIR: &str = "uploads";
    /// Root for per-request analyzer working directories
    pub const WORK_DIR: &str = "work";
    /// Where the analyzer writes images, relative to its working directory
    pub const IMAGES_SUBDIR: &str = "public/graphs";
    /// Config file looked up in the current directory and its parents
    pub const CONFIG_FILE_NAME: &str = ".pcap-report.toml";
    /// Extensions treated as images when collecting analyzer output
    pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "svg"];
}

/// Analyzer invocation defaults
pub mod analyzer {
    /// Interpreter used by the source deployment
    pub const DEFAULT_PROGRAM: &str = "python";
    /// Script handed to the interpreter
    pub const DEFAULT_SCRIPT: &str = "main.py";
    /// Bytes of stderr kept in failure diagnostics
    pub const DIAGNOSTIC_TAIL_BYTES: usize = 4096;
}

/// Renderer labels
pub mod labels {
    /// Title used for datasets nobody registered a label for
    pub const UNKNOWN: &str = "Unknown";
}
