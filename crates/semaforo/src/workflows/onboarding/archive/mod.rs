//! Archival routing of expired customer blocks.

pub mod drive;
mod sink;

pub use drive::{DriveArchiveSink, DriveFolders, DriveGateway, DriveOperationError, GoogleDriveClient};
pub use sink::{ExportError, ExportSink, LocalArchiveSink};

use super::domain::CustomerRecord;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Destination batch of an expired block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    /// Day-3 row ended RED.
    Closed,
    /// Day-3 row ended BLUE_FINALIZED.
    Finalized,
    /// Any other day-3 status; only produced when [`ArchivePolicy::archive_unrouted`] is set.
    Expired,
}

impl ArchiveKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Finalized => "finalized",
            Self::Expired => "expired",
        }
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Closed => "closed/lost",
            Self::Finalized => "finalized/won",
            Self::Expired => "expired/unrouted",
        }
    }
}

/// Controls which purged blocks produce an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchivePolicy {
    pub archive_unrouted: bool,
}

/// Rows routed to one export destination in a single sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveBatch {
    pub kind: ArchiveKind,
    pub generated_at: NaiveDateTime,
    pub rows: Vec<CustomerRecord>,
}

impl ArchiveBatch {
    /// `<kind>_<YYYYMMDD_HHMMSS>`, unique per sweep.
    pub fn label(&self) -> String {
        format!(
            "{}_{}",
            self.kind.label(),
            self.generated_at.format("%Y%m%d_%H%M%S")
        )
    }
}

/// Where a batch ended up after a successful export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveReceipt {
    pub kind: ArchiveKind,
    pub label: String,
    pub rows: usize,
    pub location: String,
}

/// A batch the sink rejected. The rows were still purged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFailure {
    pub kind: ArchiveKind,
    pub label: String,
    pub rows: usize,
    pub error: String,
}
