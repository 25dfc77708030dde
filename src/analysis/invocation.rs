use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analysis::scope::RequestScope;
use crate::config::Config;
use crate::core::constants::analyzer;
use crate::upload::UploadedCapture;

/// How to call the analyzer, resolved once from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    pub program: String,
    pub script_args: Vec<String>,
    pub outputs: Vec<String>,
    pub images_subdir: PathBuf,
    pub port_scan_threshold: Option<u32>,
    pub timeout: Duration,
}

impl AnalyzerSettings {
    pub fn from_config(config: &Config) -> Self {
        let script_args = config
            .analyzer_args
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(resolve_script_arg)
            .collect();

        Self {
            program: config
                .analyzer_program
                .clone()
                .unwrap_or_else(|| analyzer::DEFAULT_PROGRAM.to_string()),
            script_args,
            outputs: config.output_names(),
            images_subdir: config.images_subdir(),
            port_scan_threshold: config.port_scan_threshold,
            timeout: config.analyzer_timeout_duration(),
        }
    }

    /// The call that analyzes `capture` inside `scope`
    pub fn invocation_for(
        &self,
        capture: &UploadedCapture,
        scope: &RequestScope,
    ) -> AnalysisInvocation {
        AnalysisInvocation {
            program: self.program.clone(),
            script_args: self.script_args.clone(),
            capture_path: capture.staged_path.clone(),
            outputs: self
                .outputs
                .iter()
                .map(|name| scope.output_path(name))
                .collect(),
            working_dir: scope.dir().to_path_buf(),
            port_scan_threshold: self.port_scan_threshold,
            timeout: self.timeout,
        }
    }
}

/// Relative script paths refer to the server's directory, not the request scope
fn resolve_script_arg(arg: String) -> String {
    match std::env::current_dir() {
        Ok(base) => resolve_script_arg_in(&base, arg),
        Err(_) => arg,
    }
}

fn resolve_script_arg_in(base: &Path, arg: String) -> String {
    let path = Path::new(&arg);
    if path.is_relative() {
        let candidate = base.join(path);
        if candidate.is_file() {
            return candidate.to_string_lossy().into_owned();
        }
    }
    arg
}

/// One analyzer call: `program [script args..] capture out1 out2 .. [threshold]`
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisInvocation {
    pub program: String,
    pub script_args: Vec<String>,
    pub capture_path: PathBuf,
    pub outputs: Vec<PathBuf>,
    pub working_dir: PathBuf,
    pub port_scan_threshold: Option<u32>,
    pub timeout: Duration,
}

impl AnalysisInvocation {
    /// Arguments passed after the program name
    pub fn args(&self) -> Vec<String> {
        let mut args = self.script_args.clone();
        args.push(self.capture_path.to_string_lossy().into_owned());
        args.extend(
            self.outputs
                .iter()
                .map(|output| output.to_string_lossy().into_owned()),
        );
        if let Some(threshold) = self.port_scan_threshold {
            args.push(threshold.to_string());
        }
        args
    }

    /// Full command line, program first
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        argv.extend(self.args());
        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn capture(path: &str) -> UploadedCapture {
        UploadedCapture {
            field_name: "pcapfile".to_string(),
            original_name: "capture.pcap".to_string(),
            staged_path: PathBuf::from(path),
            size: 10,
        }
    }

    #[tokio::test]
    async fn test_invocation_argument_order() -> TestResult {
        let root = tempfile::tempdir()?;
        let scope = RequestScope::create(root.path(), "pcapfile-1").await?;
        let settings = AnalyzerSettings {
            program: "python".to_string(),
            script_args: vec!["/srv/main.py".to_string()],
            outputs: vec![
                "protocol_distribution.csv".to_string(),
                "top_ip_communications.csv".to_string(),
                "share_of_protocol_between_ips.csv".to_string(),
            ],
            images_subdir: PathBuf::from("public/graphs"),
            port_scan_threshold: None,
            timeout: Duration::from_secs(5),
        };

        let invocation = settings.invocation_for(&capture("/srv/uploads/pcapfile-1.pcap"), &scope);
        let scope_dir = scope.dir().to_string_lossy().into_owned();

        assert_eq!(
            invocation.argv(),
            vec![
                "python".to_string(),
                "/srv/main.py".to_string(),
                "/srv/uploads/pcapfile-1.pcap".to_string(),
                format!("{scope_dir}/protocol_distribution.csv"),
                format!("{scope_dir}/top_ip_communications.csv"),
                format!("{scope_dir}/share_of_protocol_between_ips.csv"),
            ]
        );
        assert_eq!(invocation.working_dir, scope.dir());
        Ok(())
    }

    #[test]
    fn test_threshold_is_appended_last() {
        let invocation = AnalysisInvocation {
            program: "analyzer".to_string(),
            script_args: vec![],
            capture_path: PathBuf::from("in.pcap"),
            outputs: vec![PathBuf::from("a.csv")],
            working_dir: PathBuf::from("."),
            port_scan_threshold: Some(250),
            timeout: Duration::from_secs(1),
        };

        assert_eq!(
            invocation.args(),
            vec!["in.pcap".to_string(), "a.csv".to_string(), "250".to_string()]
        );
    }

    #[test]
    fn test_settings_from_default_config() {
        let settings = AnalyzerSettings::from_config(&Config::default());
        assert_eq!(settings.program, "python");
        assert_eq!(settings.outputs.len(), 3);
        assert_eq!(settings.timeout, Duration::from_secs(300));
        assert_eq!(settings.images_subdir, PathBuf::from("public/graphs"));
        assert_eq!(settings.port_scan_threshold, None);
    }

    #[test]
    fn test_resolve_script_arg() -> TestResult {
        let base = tempfile::tempdir()?;
        std::fs::write(base.path().join("main.py"), "print('analyzer')")?;

        let resolved = resolve_script_arg_in(base.path(), "main.py".to_string());
        assert_eq!(PathBuf::from(&resolved), base.path().join("main.py"));

        // Flags, missing files and absolute paths pass through untouched
        assert_eq!(resolve_script_arg_in(base.path(), "-u".to_string()), "-u");
        assert_eq!(resolve_script_arg_in(base.path(), "not-here.py".to_string()), "not-here.py");
        assert_eq!(resolve_script_arg("/srv/main.py".to_string()), "/srv/main.py");
        Ok(())
    }
}
