use super::job::{FinishingJob, JobKind};
use crate::error::TaskError;
use crate::picture::PictureFormat;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Post-capture action on a finished picture (save, print, upload, ...)
#[async_trait]
pub trait FinishingTask: Send + Sync {
    fn name(&self) -> &str;

    /// Run the task for `job.picture` written under `job.destination`
    async fn execute(&self, job: &FinishingJob) -> Result<(), TaskError>;
}

/// Writes the picture buffer to `<basedir>/<destination>.<ext>`
pub struct PictureSaver {
    basedir: PathBuf,
}

impl PictureSaver {
    pub fn new<P: Into<PathBuf>>(basedir: P) -> Self {
        Self {
            basedir: basedir.into(),
        }
    }

    pub fn path_for(&self, destination: &str, format: PictureFormat) -> PathBuf {
        self.basedir
            .join(format!("{}.{}", destination, format.extension()))
    }
}

#[async_trait]
impl FinishingTask for PictureSaver {
    fn name(&self) -> &str {
        "picture-saver"
    }

    async fn execute(&self, job: &FinishingJob) -> Result<(), TaskError> {
        let path = self.path_for(&job.destination, job.picture.format());
        let io_error = |source| TaskError::Io {
            task: self.name().to_string(),
            destination: path.display().to_string(),
            source,
        };

        ensure_parent(&path).await.map_err(io_error)?;
        fs::write(&path, job.picture.data())
            .await
            .map_err(io_error)?;

        info!("Saving picture as {}", path.display());
        Ok(())
    }
}

/// JSON sidecar describing a saved picture
#[derive(Debug, Serialize)]
struct PictureMetadata<'a> {
    session: Uuid,
    kind: JobKind,
    destination: &'a str,
    width: u32,
    height: u32,
    format: PictureFormat,
    captured_at: DateTime<Utc>,
}

/// Writes `<basedir>/<destination>.json` next to the saved picture
pub struct MetadataWriter {
    basedir: PathBuf,
}

impl MetadataWriter {
    pub fn new<P: Into<PathBuf>>(basedir: P) -> Self {
        Self {
            basedir: basedir.into(),
        }
    }
}

#[async_trait]
impl FinishingTask for MetadataWriter {
    fn name(&self) -> &str {
        "metadata-writer"
    }

    async fn execute(&self, job: &FinishingJob) -> Result<(), TaskError> {
        let path = self.basedir.join(format!("{}.json", job.destination));
        let metadata = PictureMetadata {
            session: job.session,
            kind: job.kind,
            destination: &job.destination,
            width: job.picture.width(),
            height: job.picture.height(),
            format: job.picture.format(),
            captured_at: DateTime::<Utc>::from(job.picture.captured_at()),
        };

        let json =
            serde_json::to_string_pretty(&metadata).map_err(|e| TaskError::Serialization {
                task: self.name().to_string(),
                destination: job.destination.clone(),
                details: e.to_string(),
            })?;

        let io_error = |source| TaskError::Io {
            task: self.name().to_string(),
            destination: path.display().to_string(),
            source,
        };
        ensure_parent(&path).await.map_err(io_error)?;
        fs::write(&path, json).await.map_err(io_error)?;

        debug!("Saved metadata to {}", path.display());
        Ok(())
    }
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}
