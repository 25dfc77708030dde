use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use tokio::fs;

use crate::analysis::RequestScope;
use crate::config::Config;
use crate::core::constants::{http, paths};
use crate::core::error::{ReportError, Result};
use crate::report::payload::{ReportDataset, ReportPayload};
use crate::reporting::logging;
use crate::upload::UploadedCapture;

/// Turns the files an analyzer run left in its scope into a payload
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    outputs: Vec<String>,
    images_subdir: PathBuf,
    graphs_root: PathBuf,
}

impl ReportAssembler {
    pub fn new<I: Into<PathBuf>, G: Into<PathBuf>>(
        outputs: Vec<String>,
        images_subdir: I,
        graphs_root: G,
    ) -> Self {
        Self {
            outputs,
            images_subdir: images_subdir.into(),
            graphs_root: graphs_root.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.output_names(),
            config.images_subdir(),
            config.graphs_path(),
        )
    }

    /// Build the payload; any unreadable dataset fails the whole report
    pub async fn assemble(
        &self,
        scope: &RequestScope,
        capture: &UploadedCapture,
    ) -> Result<ReportPayload> {
        let csv_data = self.read_datasets(scope).await?;
        let images = self.collect_images(scope).await?;

        logging::log_payload_assembled(csv_data.len(), images.len());

        Ok(ReportPayload {
            csv_data,
            images,
            file_name: capture.original_name.clone(),
            is_file_uploaded: true,
        })
    }

    /// Read every expected dataset, preserving the requested order
    pub async fn read_datasets(&self, scope: &RequestScope) -> Result<Vec<ReportDataset>> {
        let reads = self
            .outputs
            .iter()
            .map(|name| read_dataset(scope.output_path(name), name));
        let results = join_all(reads).await;

        let mut datasets = Vec::with_capacity(results.len());
        let mut missing = Vec::new();
        for result in results {
            match result {
                Ok(dataset) => datasets.push(dataset),
                Err(ReportError::MissingArtifacts(mut names)) => missing.append(&mut names),
                Err(e) => return Err(e),
            }
        }

        if !missing.is_empty() {
            return Err(ReportError::MissingArtifacts(missing));
        }
        Ok(datasets)
    }

    /// Publish the scope's images under the graphs root and return their URLs
    pub async fn collect_images(&self, scope: &RequestScope) -> Result<Vec<String>> {
        let source_dir = scope.images_dir(&self.images_subdir);
        let mut entries = match fs::read_dir(&source_dir).await {
            Ok(entries) => entries,
            // No images is a normal outcome
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && is_image(&path) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        if names.is_empty() {
            return Ok(names);
        }
        names.sort();

        let target_dir = self.graphs_root.join(scope.id());
        fs::create_dir_all(&target_dir).await?;

        let prefix = http::GRAPHS_ROUTE.trim_start_matches('/');
        let mut images = Vec::with_capacity(names.len());
        for name in names {
            if let Err(e) = fs::copy(source_dir.join(&name), target_dir.join(&name)).await {
                // Never leave a partial image set published
                discard_published(&target_dir).await;
                return Err(e.into());
            }
            images.push(format!("{prefix}/{}/{name}", scope.id()));
        }
        Ok(images)
    }

    /// Filesystem location behind an image reference from `collect_images`
    pub fn local_image_path(&self, reference: &str) -> Option<PathBuf> {
        let prefix = http::GRAPHS_ROUTE.trim_start_matches('/');
        reference
            .strip_prefix(prefix)?
            .strip_prefix('/')
            .map(|rest| self.graphs_root.join(rest))
    }
}

async fn read_dataset(path: PathBuf, name: &str) -> Result<ReportDataset> {
    let bytes = match fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ReportError::MissingArtifacts(vec![name.to_string()]));
        }
        Err(source) => {
            return Err(ReportError::ArtifactRead {
                file: name.to_string(),
                source,
            });
        }
    };

    let data =
        String::from_utf8(bytes).map_err(|_| ReportError::ArtifactEncoding(name.to_string()))?;
    Ok(ReportDataset::new(name, data))
}

async fn discard_published(target_dir: &Path) {
    if let Err(e) = fs::remove_dir_all(target_dir).await {
        logging::log_warning(&format!(
            "Could not remove partially published images {}: {e}",
            target_dir.display()
        ));
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| paths::IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
