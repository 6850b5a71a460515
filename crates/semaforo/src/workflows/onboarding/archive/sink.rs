use super::drive::DriveOperationError;
use super::ArchiveBatch;
use crate::workflows::onboarding::store::{write_records, StoreError};
use std::fs;
use std::path::PathBuf;

/// Receives archival batches for persistence or upload.
pub trait ExportSink: Send + Sync {
    /// Stores the batch and returns where it landed.
    fn archive(&self, batch: &ArchiveBatch) -> Result<String, ExportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("archive io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to encode archive batch: {0}")]
    Encode(#[from] StoreError),
    #[error(transparent)]
    Drive(#[from] DriveOperationError),
    #[error("archive rejected: {0}")]
    Rejected(String),
}

/// Writes each batch as `<label>.csv` into a local directory.
#[derive(Debug, Clone)]
pub struct LocalArchiveSink {
    directory: PathBuf,
}

impl LocalArchiveSink {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl ExportSink for LocalArchiveSink {
    fn archive(&self, batch: &ArchiveBatch) -> Result<String, ExportError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(format!("{}.csv", batch.label()));
        let file = fs::File::create(&path)?;
        write_records(file, &batch.rows)?;
        Ok(path.display().to_string())
    }
}
