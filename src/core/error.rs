use std::fmt;
use std::time::Duration;

/// Everything that can go wrong between receiving an upload and drawing the report
#[derive(Debug)]
pub enum ReportError {
    /// IO error (staging, scope directories, image copies)
    Io(std::io::Error),

    /// Configuration error
    Config(String),

    /// TOML parsing error
    TomlParsing(toml::de::Error),

    /// Payload (de)serialization error
    Json(serde_json::Error),

    /// HTTP client error
    Http(reqwest::Error),

    /// The request carried no usable capture part
    MissingUpload(String),

    /// The multipart body was malformed or had unexpected parts
    Multipart(String),

    /// The upload exceeded the configured body limit
    UploadTooLarge(String),

    /// The analyzer could not be started
    AnalyzerLaunch {
        program: String,
        source: std::io::Error,
    },

    /// The analyzer ran and exited unsuccessfully
    AnalyzerFailed { code: Option<i32>, stderr: String },

    /// The analyzer did not finish within the configured bound
    AnalyzerTimeout(Duration),

    /// Declared outputs absent after a successful analyzer run
    MissingArtifacts(Vec<String>),

    /// A declared output exists but could not be read
    ArtifactRead {
        file: String,
        source: std::io::Error,
    },

    /// A declared output is not valid UTF-8
    ArtifactEncoding(String),

    /// A client submission is already waiting for its response
    SubmissionInFlight,

    /// The server answered a submission with a non-success status
    ServerResponse { status: u16, body: String },
}

impl ReportError {
    /// Whether the failure was caused by what the caller sent rather than by the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReportError::MissingUpload(_)
                | ReportError::Multipart(_)
                | ReportError::UploadTooLarge(_)
        )
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Io(err) => write!(f, "IO error: {err}"),
            ReportError::Config(msg) => write!(f, "Configuration error: {msg}"),
            ReportError::TomlParsing(err) => write!(f, "TOML parsing error: {err}"),
            ReportError::Json(err) => write!(f, "JSON error: {err}"),
            ReportError::Http(err) => write!(f, "HTTP error: {err}"),
            ReportError::MissingUpload(msg) => write!(f, "Missing upload: {msg}"),
            ReportError::Multipart(msg) => write!(f, "Invalid upload: {msg}"),
            ReportError::UploadTooLarge(msg) => write!(f, "Upload too large: {msg}"),
            ReportError::AnalyzerLaunch { program, source } => {
                write!(f, "Error executing analyzer: could not start '{program}': {source}")
            }
            ReportError::AnalyzerFailed { code, stderr } => {
                match code {
                    Some(code) => write!(f, "Error executing analyzer: exited with status {code}")?,
                    None => write!(f, "Error executing analyzer: terminated by signal")?,
                }
                if stderr.trim().is_empty() {
                    Ok(())
                } else {
                    write!(f, ": {}", stderr.trim())
                }
            }
            ReportError::AnalyzerTimeout(limit) => {
                write!(f, "Analyzer timed out after {}s", limit.as_secs_f64())
            }
            ReportError::MissingArtifacts(files) => {
                write!(f, "Missing analyzer output: {}", files.join(", "))
            }
            ReportError::ArtifactRead { file, source } => {
                write!(f, "Unreadable analyzer output: {file}: {source}")
            }
            ReportError::ArtifactEncoding(file) => {
                write!(f, "Unreadable analyzer output: {file} is not valid UTF-8")
            }
            ReportError::SubmissionInFlight => {
                write!(f, "Submission rejected: another submission is still in flight")
            }
            ReportError::ServerResponse { status, body } => {
                write!(f, "Server error: status {status}: {}", body.trim())
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(err) => Some(err),
            ReportError::TomlParsing(err) => Some(err),
            ReportError::Json(err) => Some(err),
            ReportError::Http(err) => Some(err),
            ReportError::AnalyzerLaunch { source, .. } => Some(source),
            ReportError::ArtifactRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err)
    }
}

impl From<toml::de::Error> for ReportError {
    fn from(err: toml::de::Error) -> Self {
        ReportError::TomlParsing(err)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Json(err)
    }
}

impl From<reqwest::Error> for ReportError {
    fn from(err: reqwest::Error) -> Self {
        ReportError::Http(err)
    }
}

/// Type alias for Results using ReportError
pub type Result<T> = std::result::Result<T, ReportError>;
