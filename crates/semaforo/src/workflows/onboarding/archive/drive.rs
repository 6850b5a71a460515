use std::fmt::Debug;
use std::io::Cursor;

use google_drive3::{api::File, api::Scope, DriveHub};
use tokio::runtime::Runtime;
use tracing::info;

use super::sink::{ExportError, ExportSink};
use super::{ArchiveBatch, ArchiveKind};
use crate::workflows::onboarding::store::write_records;

#[derive(Debug, thiserror::Error)]
pub enum DriveOperationError {
    #[error("drive operation failed: {0}")]
    Backend(String),
    #[error("drive runtime unavailable: {0}")]
    Runtime(String),
}

pub trait DriveGateway: Debug {
    /// Uploads a file and returns the Drive file id.
    fn upload_file(
        &self,
        name: &str,
        mime_type: mime::Mime,
        contents: Vec<u8>,
        parent_folder_id: &str,
    ) -> Result<String, DriveOperationError>;
}

/// Thin wrapper around the generated google-drive3 client allowing the synchronous
/// evaluation flow to upload archives without exposing async details.
///
/// Library-only: the bundled server and CLI archive through `LocalArchiveSink`. Embedders build
/// the `DriveHub` themselves and hand a [`DriveArchiveSink`] to `OnboardingService::new`. The
/// client drives its own runtime, so it must not be called from inside another tokio runtime.
pub struct GoogleDriveClient<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    hub: DriveHub<C>,
    runtime: Runtime,
}

impl<C> GoogleDriveClient<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    pub fn new(hub: DriveHub<C>, runtime: Runtime) -> Self {
        Self { hub, runtime }
    }

    pub fn with_runtime(hub: DriveHub<C>) -> Result<Self, DriveOperationError> {
        let runtime =
            Runtime::new().map_err(|err| DriveOperationError::Runtime(err.to_string()))?;
        Ok(Self::new(hub, runtime))
    }

    fn map_error<E: std::fmt::Display>(err: E) -> DriveOperationError {
        DriveOperationError::Backend(err.to_string())
    }
}

impl<C> std::fmt::Debug for GoogleDriveClient<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDriveClient").finish_non_exhaustive()
    }
}

impl<C> DriveGateway for GoogleDriveClient<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn upload_file(
        &self,
        name: &str,
        mime_type: mime::Mime,
        contents: Vec<u8>,
        parent_folder_id: &str,
    ) -> Result<String, DriveOperationError> {
        let metadata = File {
            name: Some(name.to_string()),
            mime_type: Some(mime_type.essence_str().to_string()),
            parents: Some(vec![parent_folder_id.to_string()]),
            ..File::default()
        };

        let cursor = Cursor::new(contents);

        let result = self.runtime.block_on(async {
            self.hub
                .files()
                .create(metadata)
                .param("fields", "id")
                .supports_all_drives(true)
                .add_scope(Scope::File)
                .upload(cursor, mime_type)
                .await
        });

        let (_, file) = result.map_err(GoogleDriveClient::<C>::map_error)?;
        Ok(file.id.unwrap_or_default())
    }
}

/// Drive folder receiving each archive kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveFolders {
    pub closed: String,
    pub finalized: String,
    pub expired: Option<String>,
}

impl DriveFolders {
    fn folder_for(&self, kind: ArchiveKind) -> Option<&str> {
        match kind {
            ArchiveKind::Closed => Some(self.closed.as_str()),
            ArchiveKind::Finalized => Some(self.finalized.as_str()),
            ArchiveKind::Expired => self.expired.as_deref(),
        }
    }
}

/// Uploads each batch as a CSV file into its kind's Drive folder.
#[derive(Debug)]
pub struct DriveArchiveSink<G> {
    drive: G,
    folders: DriveFolders,
}

impl<G: DriveGateway> DriveArchiveSink<G> {
    pub fn new(drive: G, folders: DriveFolders) -> Self {
        Self { drive, folders }
    }
}

impl<G> ExportSink for DriveArchiveSink<G>
where
    G: DriveGateway + Send + Sync,
{
    fn archive(&self, batch: &ArchiveBatch) -> Result<String, ExportError> {
        let folder = self.folders.folder_for(batch.kind).ok_or_else(|| {
            ExportError::Rejected(format!("no drive folder configured for {}", batch.kind.label()))
        })?;

        let mut contents = Vec::new();
        write_records(&mut contents, &batch.rows)?;

        let name = format!("{}.csv", batch.label());
        let file_id = self
            .drive
            .upload_file(&name, mime::TEXT_CSV, contents, folder)?;

        info!(%name, %file_id, rows = batch.rows.len(), "archive uploaded to drive");
        Ok(file_id)
    }
}
