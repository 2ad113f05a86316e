//! Roster collaborators around the pipeline: persistence, the remote-first
//! ingest service, roster filtering and summaries, and the HTTP router.

pub mod filter;
pub mod processor;
pub mod repository;
pub mod router;
pub mod service;
pub mod summary;

#[cfg(test)]
mod tests;

pub use filter::{RosterFilter, SortDirection, SortKey};
pub use processor::{HttpRemoteProcessor, ProcessorFuture, RemoteProcessor, RemoteProcessorError};
pub use repository::{LawyerRepository, RepositoryError};
pub use router::{roster_router, CsvBody, CsvUpload};
pub use service::{
    IngestError, IngestReport, LawyerIngestService, ProcessingMethod, ProcessingOutcome,
};
pub use summary::{BranchSummary, RosterSummary};
