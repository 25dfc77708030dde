use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::core::error::Result;

/// Working directory private to one request
///
/// The analyzer runs inside it and writes its datasets and images there, so
/// concurrent requests never see each other's output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestScope {
    id: String,
    dir: PathBuf,
}

impl RequestScope {
    /// Create `<work_root>/<id>/`, returning an absolute path to it
    pub async fn create(work_root: &Path, id: &str) -> Result<Self> {
        let dir = std::path::absolute(work_root.join(id))?;
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            id: id.to_string(),
            dir,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a named dataset is written to
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Directory the analyzer drops its images into
    pub fn images_dir(&self, subdir: &Path) -> PathBuf {
        self.dir.join(subdir)
    }

    /// Remove the scope and everything the analyzer left in it
    pub async fn remove(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
