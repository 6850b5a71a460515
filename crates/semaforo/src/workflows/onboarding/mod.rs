//! Three-day onboarding window: status derivation, expiry, and archival routing.

pub mod access;
pub mod archive;
pub mod calendar;
pub mod domain;
pub mod expiry;
pub mod report;
pub mod router;
pub mod service;
pub mod status;
pub mod store;
pub mod table;

#[cfg(test)]
mod tests;

pub use access::{AccessError, AccessScope, OperatorContext, OperatorCredential, OperatorDirectory};
pub use archive::{
    ArchiveBatch, ArchiveKind, ArchivePolicy, ArchiveReceipt, DriveArchiveSink, DriveFolders,
    DriveGateway, DriveOperationError, ExportError, ExportFailure, ExportSink, GoogleDriveClient,
    LocalArchiveSink,
};
pub use calendar::HolidayCalendar;
pub use domain::{CustomerRecord, NewCustomer, OnboardingError, Product, ProductMarks, Semaphore};
pub use expiry::{sweep, ExpirySweep, PurgedBlock};
pub use router::{onboarding_router, OnboardingApi};
pub use service::{BoardView, EvaluationOutcome, OnboardingService, OnboardingServiceError};
pub use status::recompute;
pub use store::{CsvRecordStore, RecordStore, StoreError};
pub use table::{CustomerBlock, CustomerTable, RecordFilter};
