use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, Instant};

use crate::analysis::invocation::AnalysisInvocation;
use crate::core::constants::analyzer::DIAGNOSTIC_TAIL_BYTES;
use crate::core::error::{ReportError, Result};
use crate::reporting::logging;

/// Captured streams of a successful analyzer run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Seam between the request pipeline and whatever produces the datasets
#[async_trait]
pub trait RunAnalyzer: Send + Sync {
    async fn run(&self, invocation: &AnalysisInvocation) -> Result<AnalysisOutcome>;
}

/// Runs the analyzer as a child process
#[derive(Default, Debug)]
pub struct ProcessAnalyzer {}

#[async_trait]
impl RunAnalyzer for ProcessAnalyzer {
    async fn run(&self, invocation: &AnalysisInvocation) -> Result<AnalysisOutcome> {
        logging::log_analyzer_start(&invocation.argv(), &invocation.working_dir);
        let started = Instant::now();

        let child = Command::new(&invocation.program)
            .args(invocation.args())
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Abandoning the wait below must not leave the analyzer running
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ReportError::AnalyzerLaunch {
                program: invocation.program.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await
        {
            Ok(output) => output?,
            Err(_) => return Err(ReportError::AnalyzerTimeout(invocation.timeout)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ReportError::AnalyzerFailed {
                code: output.status.code(),
                stderr: tail(&stderr, DIAGNOSTIC_TAIL_BYTES).to_string(),
            });
        }

        let elapsed = started.elapsed();
        logging::log_analyzer_finish(elapsed, &stdout, &stderr);

        Ok(AnalysisOutcome {
            stdout,
            stderr,
            elapsed,
        })
    }
}

/// Last `max_bytes` of `text`, cut on a character boundary
fn tail(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
