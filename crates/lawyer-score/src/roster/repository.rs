use crate::pipeline::{LawyerRecord, StoredLawyer};

/// Persistence collaborator for scored lawyers. Implementations assign the
/// record id and creation timestamp.
pub trait LawyerRepository: Send + Sync {
    /// Stores a batch and returns it with server-assigned ids, in input order.
    fn insert(&self, records: Vec<LawyerRecord>) -> Result<Vec<StoredLawyer>, RepositoryError>;
    /// Every stored lawyer, newest first.
    fn list_all(&self) -> Result<Vec<StoredLawyer>, RepositoryError>;
    /// Removes everything, returning how many records were dropped.
    fn clear(&self) -> Result<usize, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("repository rejected the batch: {0}")]
    Rejected(String),
}
