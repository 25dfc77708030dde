use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::core::error::Result;
use crate::reporting::logging;

/// Last timestamp handed out, so names stay unique within the process
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Milliseconds since the epoch, strictly increasing across calls
fn next_timestamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    match LAST_STAMP.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(now.max(last + 1))
    }) {
        Ok(previous) | Err(previous) => now.max(previous + 1),
    }
}

/// A capture as it was received and staged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedCapture {
    /// Form field the capture arrived in
    pub field_name: String,
    /// File name chosen by the uploader
    pub original_name: String,
    /// Where the bytes now live
    pub staged_path: PathBuf,
    /// Number of bytes staged
    pub size: u64,
}

impl UploadedCapture {
    /// Unique identifier derived from the staged name, used to scope analyzer output
    pub fn scope_id(&self) -> String {
        self.staged_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.field_name.clone())
    }

    /// Delete the staged bytes
    pub async fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.staged_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Directory receiving uploaded captures
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the staging directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Build `<field>-<timestamp>.<ext>` from the field and the uploader's file name
    pub fn staged_name(field_name: &str, original_name: &str, timestamp: i64) -> String {
        let field: String = field_name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        let field = if field.is_empty() {
            "upload".to_string()
        } else {
            field
        };

        let extension: Option<String> = Path::new(original_name)
            .extension()
            .map(|ext| {
                ext.to_string_lossy()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
            })
            .filter(|ext| !ext.is_empty());

        match extension {
            Some(ext) => format!("{field}-{timestamp}.{ext}"),
            None => format!("{field}-{timestamp}"),
        }
    }

    /// Open a new staged file; never reuses an existing name
    pub async fn begin(&self, field_name: &str, original_name: &str) -> Result<StagedUpload> {
        loop {
            let name = Self::staged_name(field_name, original_name, next_timestamp());
            // Absolute so the analyzer can find it from its own working directory
            let path = std::path::absolute(self.dir.join(&name))?;

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    return Ok(StagedUpload {
                        file: Some(file),
                        path,
                        field_name: field_name.to_string(),
                        original_name: original_name.to_string(),
                        written: 0,
                        committed: false,
                    });
                }
                // Another process staged under the same millisecond
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Stage a capture that is already on the local filesystem
    pub async fn stage_file(&self, field_name: &str, source: &Path) -> Result<UploadedCapture> {
        let original_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = fs::read(source).await?;

        let mut staged = self.begin(field_name, &original_name).await?;
        if let Err(e) = staged.write_chunk(&bytes).await {
            staged.discard().await;
            return Err(e);
        }
        staged.finish().await
    }
}

/// A capture being streamed into the staging directory
///
/// Dropped before [`StagedUpload::finish`], the partial file is removed.
#[derive(Debug)]
pub struct StagedUpload {
    file: Option<File>,
    path: PathBuf,
    field_name: String,
    original_name: String,
    written: u64,
    committed: bool,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("staged upload is already closed"))?;
        file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush and hand over the staged capture
    pub async fn finish(mut self) -> Result<UploadedCapture> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        self.committed = true;

        let capture = UploadedCapture {
            field_name: std::mem::take(&mut self.field_name),
            original_name: std::mem::take(&mut self.original_name),
            staged_path: std::mem::take(&mut self.path),
            size: self.written,
        };
        logging::log_upload_staged(&capture.original_name, &capture.staged_path, capture.size);
        Ok(capture)
    }

    /// Drop a partially written capture
    pub async fn discard(mut self) {
        drop(self.file.take());
        self.committed = true;
        if let Err(e) = fs::remove_file(&self.path).await {
            logging::log_warning(&format!(
                "Could not remove partial upload {}: {e}",
                self.path.display()
            ));
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        drop(self.file.take());
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => logging::log_warning(&format!(
                "Could not remove abandoned upload {}: {e}",
                self.path.display()
            )),
        }
    }
}
