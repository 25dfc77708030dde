//! Configuration management
//!
//! This module handles loading and managing configuration from
//! TOML files and CLI arguments.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::constants::{analyzer, datasets, http, paths, timeouts};
use crate::core::error::{ReportError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address the server listens on
    pub bind: Option<String>,

    /// Port the server listens on
    pub port: Option<u16>,

    /// Directory with the upload page and other static assets
    pub public_dir: Option<String>,

    /// Directory generated images are copied into, served under /graphs
    pub graphs_dir: Option<String>,

    /// Directory staged uploads are written to
    pub uploads_dir: Option<String>,

    /// Root of the per-request analyzer working directories
    pub work_dir: Option<String>,

    /// Executable that analyzes a capture
    pub analyzer_program: Option<String>,

    /// Arguments placed before the capture path (usually the script)
    pub analyzer_args: Option<Vec<String>>,

    /// Upper bound for one analyzer run, in seconds
    pub analyzer_timeout: Option<u64>,

    /// Dataset file names requested from the analyzer, in order
    pub outputs: Option<Vec<String>>,

    /// Where the analyzer writes images, relative to its working directory
    pub images_subdir: Option<String>,

    /// Optional port scan threshold forwarded to the analyzer
    pub port_scan_threshold: Option<u32>,

    /// Keep staged uploads after the response has been sent
    pub keep_uploads: Option<bool>,

    /// Keep per-request working directories after assembling the payload
    pub retain_artifacts: Option<bool>,

    /// Reject request bodies larger than this many bytes (unlimited when unset)
    pub max_upload_bytes: Option<usize>,

    /// Enable verbose logging
    pub verbose: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(http::DEFAULT_BIND.to_string()),
            port: Some(http::DEFAULT_PORT),
            public_dir: Some(paths::PUBLIC_DIR.to_string()),
            graphs_dir: Some(paths::GRAPHS_DIR.to_string()),
            uploads_dir: Some(paths::UPLOADS_DIR.to_string()),
            work_dir: Some(paths::WORK_DIR.to_string()),
            analyzer_program: Some(analyzer::DEFAULT_PROGRAM.to_string()),
            analyzer_args: Some(vec![analyzer::DEFAULT_SCRIPT.to_string()]),
            analyzer_timeout: Some(timeouts::DEFAULT_ANALYZER_TIMEOUT_SECONDS),
            outputs: Some(
                datasets::DEFAULT_OUTPUTS
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
            ),
            images_subdir: Some(paths::IMAGES_SUBDIR.to_string()),
            port_scan_threshold: None, // Analyzer applies its own default
            keep_uploads: Some(true),
            retain_artifacts: Some(false),
            max_upload_bytes: None, // The analyzer is the content validator
            verbose: Some(false),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults for missing keys
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!(
                "Could not read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| {
            ReportError::Config(format!(
                "Invalid TOML in config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.fill_defaults();

        // Validate the loaded configuration
        config.validate()?;
        Ok(config)
    }

    /// Try to find and load a config file in standard locations
    pub fn load_from_standard_locations() -> Self {
        if let Ok(config) = Self::load_from_file(paths::CONFIG_FILE_NAME) {
            return config;
        }

        // Parent directories (up to 3 levels)
        for i in 1..=3 {
            let path = format!("{}{}", "../".repeat(i), paths::CONFIG_FILE_NAME);
            if let Ok(config) = Self::load_from_file(&path) {
                return config;
            }
        }

        Self::default()
    }

    /// Replace unset keys with their defaults
    fn fill_defaults(&mut self) {
        let defaults = Config::default();
        macro_rules! fill {
            ($($field:ident),*) => {
                $(if self.$field.is_none() { self.$field = defaults.$field.clone(); })*
            };
        }
        fill!(
            bind,
            port,
            public_dir,
            graphs_dir,
            uploads_dir,
            work_dir,
            analyzer_program,
            analyzer_args,
            analyzer_timeout,
            outputs,
            images_subdir,
            keep_uploads,
            retain_artifacts,
            verbose
        );
    }

    /// Merge this config with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli_config: &CliConfig) {
        // Listener
        if let Some(ref bind) = cli_config.bind {
            self.bind = Some(bind.clone());
        }
        if let Some(port) = cli_config.port {
            self.port = Some(port);
        }

        // Directories
        if let Some(ref dir) = cli_config.public_dir {
            self.public_dir = Some(dir.clone());
        }
        if let Some(ref dir) = cli_config.graphs_dir {
            self.graphs_dir = Some(dir.clone());
        }
        if let Some(ref dir) = cli_config.uploads_dir {
            self.uploads_dir = Some(dir.clone());
        }
        if let Some(ref dir) = cli_config.work_dir {
            self.work_dir = Some(dir.clone());
        }

        // Analyzer
        if let Some(ref program) = cli_config.analyzer_program {
            self.analyzer_program = Some(program.clone());
        }
        if let Some(ref args) = cli_config.analyzer_args {
            self.analyzer_args = Some(args.clone());
        }
        if let Some(timeout) = cli_config.analyzer_timeout {
            self.analyzer_timeout = Some(timeout);
        }
        if let Some(threshold) = cli_config.port_scan_threshold {
            self.port_scan_threshold = Some(threshold);
        }

        // Lifecycle
        if cli_config.discard_uploads {
            self.keep_uploads = Some(false);
        }
        if cli_config.retain_artifacts {
            self.retain_artifacts = Some(true);
        }
        if let Some(limit) = cli_config.max_upload_bytes {
            self.max_upload_bytes = Some(limit);
        }

        // Output
        if cli_config.verbose {
            self.verbose = Some(true);
        }
    }

    /// Address string the listener binds to
    pub fn socket_address(&self) -> String {
        format!(
            "{}:{}",
            self.bind.as_deref().unwrap_or(http::DEFAULT_BIND),
            self.port.unwrap_or(http::DEFAULT_PORT)
        )
    }

    /// Get analyzer timeout as Duration
    pub fn analyzer_timeout_duration(&self) -> Duration {
        Duration::from_secs(
            self.analyzer_timeout
                .unwrap_or(timeouts::DEFAULT_ANALYZER_TIMEOUT_SECONDS),
        )
    }

    /// Dataset names to request, in the order the analyzer receives them
    pub fn output_names(&self) -> Vec<String> {
        match self.outputs {
            Some(ref outputs) => outputs.clone(),
            None => datasets::DEFAULT_OUTPUTS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }

    pub fn public_path(&self) -> PathBuf {
        PathBuf::from(self.public_dir.as_deref().unwrap_or(paths::PUBLIC_DIR))
    }

    pub fn graphs_path(&self) -> PathBuf {
        PathBuf::from(self.graphs_dir.as_deref().unwrap_or(paths::GRAPHS_DIR))
    }

    pub fn uploads_path(&self) -> PathBuf {
        PathBuf::from(self.uploads_dir.as_deref().unwrap_or(paths::UPLOADS_DIR))
    }

    pub fn work_path(&self) -> PathBuf {
        PathBuf::from(self.work_dir.as_deref().unwrap_or(paths::WORK_DIR))
    }

    pub fn images_subdir(&self) -> PathBuf {
        PathBuf::from(
            self.images_subdir
                .as_deref()
                .unwrap_or(paths::IMAGES_SUBDIR),
        )
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.analyzer_timeout {
            if timeout == 0 {
                return Err(ReportError::Config(
                    "Analyzer timeout cannot be 0. Expected a positive integer representing seconds."
                        .to_string(),
                ));
            }
            if timeout > timeouts::MAX_ANALYZER_TIMEOUT_SECONDS {
                return Err(ReportError::Config(format!(
                    "Analyzer timeout of {timeout} seconds is extremely large (>24 hours). Consider using a smaller value."
                )));
            }
        }

        if self.port == Some(0) {
            return Err(ReportError::Config(
                "Port cannot be 0. Expected a number between 1-65535.".to_string(),
            ));
        }

        if let Some(ref program) = self.analyzer_program
            && program.trim().is_empty()
        {
            return Err(ReportError::Config(
                "Analyzer program cannot be empty.".to_string(),
            ));
        }

        if let Some(ref outputs) = self.outputs {
            if outputs.is_empty() {
                return Err(ReportError::Config(
                    "At least one analyzer output must be configured.".to_string(),
                ));
            }
            let mut seen = HashSet::new();
            for name in outputs {
                if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
                    return Err(ReportError::Config(format!(
                        "Output name '{name}' must be a plain file name."
                    )));
                }
                if !seen.insert(name.as_str()) {
                    return Err(ReportError::Config(format!(
                        "Output name '{name}' is listed more than once."
                    )));
                }
            }
        }

        if self.max_upload_bytes == Some(0) {
            return Err(ReportError::Config(
                "Upload limit cannot be 0. Leave it unset to accept any size.".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration options that can come from CLI
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CliConfig {
    // Listener
    pub bind: Option<String>, // --bind
    pub port: Option<u16>,    // --port

    // Directories
    pub public_dir: Option<String>,  // --public-dir
    pub graphs_dir: Option<String>,  // --graphs-dir
    pub uploads_dir: Option<String>, // --uploads-dir
    pub work_dir: Option<String>,    // --work-dir

    // Analyzer
    pub analyzer_program: Option<String>,   // --analyzer
    pub analyzer_args: Option<Vec<String>>, // --analyzer-arg
    pub analyzer_timeout: Option<u64>,      // --timeout
    pub port_scan_threshold: Option<u32>,   // --port-scan-threshold

    // Lifecycle
    pub discard_uploads: bool,           // --discard-uploads
    pub retain_artifacts: bool,          // --retain-artifacts
    pub max_upload_bytes: Option<usize>, // --max-upload-bytes

    // Output
    pub quiet: bool,   // --quiet
    pub verbose: bool, // --verbose

    // Configuration
    pub config_file: Option<String>, // --config
    pub no_config: bool,             // --no-config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.port, Some(3000));
        assert_eq!(config.analyzer_program, Some("python".to_string()));
        assert_eq!(config.analyzer_args, Some(vec!["main.py".to_string()]));
        assert_eq!(config.keep_uploads, Some(true));
        assert_eq!(config.retain_artifacts, Some(false));
        assert_eq!(config.max_upload_bytes, None);
        assert_eq!(config.output_names().len(), 3);
    }

    #[test]
    fn test_config_load_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(
            b"port = 8080\nanalyzer_program = \"python3\"\nanalyzer_timeout = 60\nport_scan_threshold = 50",
        )?;

        let config = Config::load_from_file(file.path())?;
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.analyzer_program, Some("python3".to_string()));
        assert_eq!(config.analyzer_timeout, Some(60));
        assert_eq!(config.port_scan_threshold, Some(50));

        // Keys absent from the file keep their defaults
        assert_eq!(config.bind, Some("127.0.0.1".to_string()));
        assert_eq!(config.analyzer_args, Some(vec!["main.py".to_string()]));

        Ok(())
    }

    #[test]
    fn test_config_load_from_file_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"invalid toml content [").unwrap();

        let result = Config::load_from_file(file.path());
        assert!(matches!(result, Err(ReportError::Config(_))));
    }

    #[test]
    fn test_config_load_from_file_nonexistent() {
        let result = Config::load_from_file("/path/that/does/not/exist.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load_from_file_with_validation() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"analyzer_timeout = 0")?;

        assert!(Config::load_from_file(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_config_load_from_standard_locations() {
        // Falls back to defaults when no config file exists
        let config = Config::load_from_standard_locations();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_merge_with_cli() {
        let mut config = Config::default();
        let cli_config = CliConfig {
            port: Some(9000),
            analyzer_program: Some("sh".to_string()),
            analyzer_args: Some(vec!["run.sh".to_string()]),
            discard_uploads: true,
            verbose: true,
            ..Default::default()
        };

        config.merge_with_cli(&cli_config);

        assert_eq!(config.port, Some(9000));
        assert_eq!(config.analyzer_program, Some("sh".to_string()));
        assert_eq!(config.analyzer_args, Some(vec!["run.sh".to_string()]));
        assert_eq!(config.keep_uploads, Some(false));
        assert_eq!(config.verbose, Some(true));
    }

    #[test]
    fn test_config_merge_preserves_unset_values() {
        let mut config = Config {
            port: Some(4000),
            analyzer_timeout: Some(12),
            ..Default::default()
        };

        let cli_config = CliConfig {
            bind: Some("0.0.0.0".to_string()),
            ..Default::default()
        };

        config.merge_with_cli(&cli_config);

        assert_eq!(config.bind, Some("0.0.0.0".to_string()));
        assert_eq!(config.port, Some(4000));
        assert_eq!(config.analyzer_timeout, Some(12));
        assert_eq!(config.keep_uploads, Some(true));
    }

    #[test]
    fn test_socket_address() {
        let config = Config {
            bind: Some("0.0.0.0".to_string()),
            port: Some(8081),
            ..Default::default()
        };
        assert_eq!(config.socket_address(), "0.0.0.0:8081");
    }

    #[test]
    fn test_analyzer_timeout_duration() {
        let config = Config {
            analyzer_timeout: Some(45),
            ..Default::default()
        };
        assert_eq!(config.analyzer_timeout_duration(), Duration::from_secs(45));

        let unset = Config {
            analyzer_timeout: None,
            ..Default::default()
        };
        assert_eq!(unset.analyzer_timeout_duration(), Duration::from_secs(300));
    }

    #[test]
    fn test_config_validation_invalid_timeout() {
        let config = Config {
            analyzer_timeout: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            analyzer_timeout: Some(100_000),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_outputs() {
        let empty = Config {
            outputs: Some(vec![]),
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let nested = Config {
            outputs: Some(vec!["../escape.csv".to_string()]),
            ..Default::default()
        };
        assert!(nested.validate().is_err());

        let duplicated = Config {
            outputs: Some(vec!["a.csv".to_string(), "a.csv".to_string()]),
            ..Default::default()
        };
        assert!(duplicated.validate().is_err());
    }

    #[test]
    fn test_config_validation_misc() {
        let port_zero = Config {
            port: Some(0),
            ..Default::default()
        };
        assert!(port_zero.validate().is_err());

        let blank_program = Config {
            analyzer_program: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank_program.validate().is_err());

        let zero_limit = Config {
            max_upload_bytes: Some(0),
            ..Default::default()
        };
        assert!(zero_limit.validate().is_err());
    }

    #[test]
    fn test_config_validation_valid_config() -> Result<()> {
        let config = Config {
            port: Some(1),
            analyzer_timeout: Some(1),
            outputs: Some(vec!["dns_requests.csv".to_string()]),
            max_upload_bytes: Some(1024),
            ..Default::default()
        };
        config.validate()?;
        Ok(())
    }

    #[test]
    fn test_directory_accessors() {
        let config = Config {
            uploads_dir: Some("/tmp/staging".to_string()),
            ..Default::default()
        };
        assert_eq!(config.uploads_path(), PathBuf::from("/tmp/staging"));
        assert_eq!(config.work_path(), PathBuf::from("work"));
        assert_eq!(config.graphs_path(), PathBuf::from("graphs"));
        assert_eq!(config.public_path(), PathBuf::from("public"));
        assert_eq!(config.images_subdir(), PathBuf::from("public/graphs"));
    }

    #[test]
    fn test_cli_config_default() {
        let cli_config = CliConfig::default();
        assert_eq!(cli_config.port, None);
        assert_eq!(cli_config.analyzer_program, None);
        assert!(!cli_config.discard_uploads);
        assert!(!cli_config.retain_artifacts);
        assert!(!cli_config.quiet);
        assert!(!cli_config.no_config);
    }
}
