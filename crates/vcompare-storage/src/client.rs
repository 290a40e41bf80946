//! Filesystem-backed media store.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, info};
use uuid::Uuid;
use vcompare_models::encoding::OUTPUT_EXTENSION;

use crate::error::{StorageError, StorageResult};

/// Configuration for the media store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory for transient uploaded inputs
    pub upload_dir: PathBuf,
    /// Directory for generated comparison videos
    pub output_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        }
    }
}

/// Store for uploaded inputs and generated outputs.
///
/// Every request works under its own job id, so concurrent requests never
/// touch the same paths.
#[derive(Debug, Clone)]
pub struct MediaStore {
    config: StoreConfig,
}

impl MediaStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Create the upload and output directories if missing.
    pub async fn ensure_dirs(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.config.upload_dir).await?;
        fs::create_dir_all(&self.config.output_dir).await?;
        info!(
            upload_dir = %self.config.upload_dir.display(),
            output_dir = %self.config.output_dir.display(),
            "Ensured storage directories exist"
        );
        Ok(())
    }

    /// Fresh collision-free job id.
    pub fn new_job_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Path of an uploaded input: `<job_id>_<slot>.<ext>`.
    pub fn upload_path(&self, job_id: &str, slot: u8, ext: &str) -> PathBuf {
        self.config
            .upload_dir
            .join(format!("{}_{}.{}", job_id, slot, ext))
    }

    /// Persist an uploaded input and return its path.
    pub async fn stage_upload(
        &self,
        job_id: &str,
        slot: u8,
        ext: &str,
        data: &[u8],
    ) -> StorageResult<PathBuf> {
        let path = self.upload_path(job_id, slot, ext);
        fs::write(&path, data).await.map_err(|e| {
            StorageError::upload_failed(format!("{}: {}", path.display(), e))
        })?;
        debug!(job_id, path = %path.display(), bytes = data.len(), "Staged upload");
        Ok(path)
    }

    /// File name of a job's comparison output.
    pub fn output_filename(job_id: &str) -> String {
        format!("{}_output.{}", job_id, OUTPUT_EXTENSION)
    }

    /// Path a job's comparison output is written to.
    pub fn output_path(&self, job_id: &str) -> PathBuf {
        self.config.output_dir.join(Self::output_filename(job_id))
    }

    /// Locate an existing output file by name.
    ///
    /// Names that could escape the output directory are rejected.
    pub async fn resolve_output(&self, filename: &str) -> StorageResult<PathBuf> {
        validate_filename(filename)?;

        let path = self.config.output_dir.join(filename);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StorageError::not_found(filename)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(filename))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Delete files, logging failures instead of returning them.
    ///
    /// Blocking so it can run from drop guards. Runs on the async worker thread,
/// so callers pass only a request's few staged inputs.
    pub fn discard_blocking(paths: &[PathBuf]) {
        for path in paths {
            match std::fs::remove_file(path) {
                Ok(()) => info!(path = %path.display(), "Cleaned up temporary file"),
                Err(e) => error!(path = %path.display(), "Error deleting file: {}", e),
            }
        }
    }
}

/// Reject empty names, separators, parent references and NUL bytes.
pub fn validate_filename(filename: &str) -> StorageResult<()> {
    if filename.is_empty()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains('\0')
    {
        return Err(StorageError::invalid_key(filename));
    }
    Ok(())
}
