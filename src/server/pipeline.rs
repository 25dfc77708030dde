use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;

use crate::analysis::{AnalyzerSettings, ProcessAnalyzer, RequestScope, RunAnalyzer};
use crate::config::Config;
use crate::core::constants::http;
use crate::core::error::Result;
use crate::report::{ReportAssembler, ReportPayload};
use crate::reporting::logging;
use crate::upload::{StagingArea, UploadedCapture};

/// Everything one upload goes through after its bytes are staged
pub struct ReportPipeline {
    staging: StagingArea,
    work_root: PathBuf,
    graphs_root: PathBuf,
    settings: AnalyzerSettings,
    analyzer: Arc<dyn RunAnalyzer>,
    assembler: ReportAssembler,
    keep_uploads: bool,
    retain_artifacts: bool,
}

impl ReportPipeline {
    pub fn from_config(config: &Config) -> Self {
        Self {
            staging: StagingArea::new(config.uploads_path()),
            work_root: config.work_path(),
            graphs_root: config.graphs_path(),
            settings: AnalyzerSettings::from_config(config),
            analyzer: Arc::new(ProcessAnalyzer::default()),
            assembler: ReportAssembler::from_config(config),
            keep_uploads: config.keep_uploads.unwrap_or(true),
            retain_artifacts: config.retain_artifacts.unwrap_or(false),
        }
    }

    /// Swap the process runner for another implementation
    pub fn with_analyzer(mut self, analyzer: Arc<dyn RunAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    pub fn assembler(&self) -> &ReportAssembler {
        &self.assembler
    }

    /// Create the upload, work and graphs directories
    pub async fn prepare(&self) -> Result<()> {
        self.staging.ensure_dir().await?;
        fs::create_dir_all(&self.work_root).await?;
        fs::create_dir_all(&self.graphs_root).await?;
        Ok(())
    }

    /// Analyze a staged capture inside its own scope and assemble the payload
    ///
    /// Datasets are only read after the analyzer exits successfully.
    pub async fn process(&self, capture: &UploadedCapture) -> Result<ReportPayload> {
        let scope = RequestScope::create(&self.work_root, &capture.scope_id()).await?;

        let result = self.analyze_in(&scope, capture).await;
        self.clean_up(&scope, capture).await;
        result
    }

    /// Stage a capture from the local filesystem and process it
    pub async fn process_file(&self, path: &Path) -> Result<ReportPayload> {
        self.prepare().await?;
        let capture = self.staging.stage_file(http::CAPTURE_FIELD, path).await?;
        self.process(&capture).await
    }

    async fn analyze_in(
        &self,
        scope: &RequestScope,
        capture: &UploadedCapture,
    ) -> Result<ReportPayload> {
        let invocation = self.settings.invocation_for(capture, scope);
        self.analyzer.run(&invocation).await?;
        self.assembler.assemble(scope, capture).await
    }

    async fn clean_up(&self, scope: &RequestScope, capture: &UploadedCapture) {
        if !self.retain_artifacts
            && let Err(e) = scope.remove().await
        {
            logging::log_warning(&format!(
                "Could not remove work directory {}: {e}",
                scope.dir().display()
            ));
        }
        if !self.keep_uploads
            && let Err(e) = capture.remove().await
        {
            logging::log_warning(&format!(
                "Could not remove staged upload {}: {e}",
                capture.staged_path.display()
            ));
        }
    }
}
