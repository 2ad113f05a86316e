use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::filter::RosterFilter;
use super::processor::{RemoteProcessor, RemoteProcessorError};
use super::repository::{LawyerRepository, RepositoryError};
use super::summary::RosterSummary;
use crate::config::PipelineConfig;
use crate::pipeline::{
    FeatureEngineer, InputError, LawyerPipeline, LawyerRecord, LawyerScorer, PipelineOutput,
    RowError, SeededPlaceholders, StoredLawyer,
};

/// Which processor produced a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMethod {
    Remote,
    Local,
}

/// Records produced for one upload, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingOutcome {
    pub method: ProcessingMethod,
    pub fallback_used: bool,
    pub records: Vec<LawyerRecord>,
    /// Only known when the local pipeline ran.
    pub rows_processed: Option<usize>,
    pub skipped_rows: Vec<RowError>,
    pub synthesized: bool,
}

/// Response body for a persisted upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub method: ProcessingMethod,
    pub fallback_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_processed: Option<usize>,
    pub rows_skipped: usize,
    pub skipped_rows: Vec<RowError>,
    pub synthesized: bool,
    pub lawyers: Vec<StoredLawyer>,
}

/// Service composing the optional remote processor, the local pipeline, and
/// the repository.
pub struct LawyerIngestService<R> {
    pipeline: Arc<LawyerPipeline>,
    repository: Arc<R>,
    remote: Option<Arc<dyn RemoteProcessor>>,
    placeholder_seed: Option<u64>,
}

impl<R> LawyerIngestService<R>
where
    R: LawyerRepository + 'static,
{
    pub fn new(pipeline: LawyerPipeline, repository: Arc<R>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            repository,
            remote: None,
            placeholder_seed: None,
        }
    }

    pub fn from_config(config: &PipelineConfig, repository: Arc<R>) -> Self {
        let pipeline = LawyerPipeline::new(
            FeatureEngineer::for_today(),
            LawyerScorer::new(config.weights.clone()),
        )
        .with_sample_synthesis(config.sample_on_empty);

        Self::new(pipeline, repository).with_placeholder_seed(config.placeholder_seed)
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteProcessor>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Fixes placeholder generation so repeated uploads produce the same ids.
    pub fn with_placeholder_seed(mut self, seed: Option<u64>) -> Self {
        self.placeholder_seed = seed;
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    fn placeholders(&self) -> SeededPlaceholders {
        match self.placeholder_seed {
            Some(seed) => SeededPlaceholders::new(seed),
            None => SeededPlaceholders::from_clock(),
        }
    }

    /// Runs the local pipeline only. Nothing is persisted.
    pub fn preview(&self, csv: &str) -> Result<PipelineOutput, InputError> {
        self.pipeline.run(csv, &mut self.placeholders())
    }

    /// Remote processor first when configured, then the local pipeline. The
    /// second path only starts once the first has finished failing.
    pub async fn process(&self, csv: &str) -> Result<ProcessingOutcome, IngestError> {
        let remote_failure = match &self.remote {
            Some(remote) => match remote.process(csv).await {
                Ok(records) => {
                    info!(lawyers = records.len(), "csv processed by remote processor");
                    return Ok(ProcessingOutcome {
                        method: ProcessingMethod::Remote,
                        fallback_used: false,
                        records,
                        rows_processed: None,
                        skipped_rows: Vec::new(),
                        synthesized: false,
                    });
                }
                Err(err) => {
                    warn!(error = %err, "remote processor failed, falling back to local pipeline");
                    Some(err)
                }
            },
            None => None,
        };

        match (self.preview(csv), remote_failure) {
            (Ok(output), remote_failure) => Ok(ProcessingOutcome {
                method: ProcessingMethod::Local,
                fallback_used: remote_failure.is_some(),
                records: output.records,
                rows_processed: Some(output.rows_processed),
                skipped_rows: output.skipped_rows,
                synthesized: output.synthesized,
            }),
            (Err(local), Some(remote)) => Err(IngestError::ProcessorsExhausted { remote, local }),
            (Err(local), None) => Err(IngestError::Pipeline(local)),
        }
    }

    /// Processes an upload and persists the resulting records.
    pub async fn ingest(&self, csv: &str) -> Result<IngestReport, IngestError> {
        let outcome = self.process(csv).await?;
        let lawyers = self.repository.insert(outcome.records)?;

        info!(
            method = ?outcome.method,
            fallback = outcome.fallback_used,
            stored = lawyers.len(),
            "lawyer upload persisted"
        );

        Ok(IngestReport {
            method: outcome.method,
            fallback_used: outcome.fallback_used,
            rows_processed: outcome.rows_processed,
            rows_skipped: outcome.skipped_rows.len(),
            skipped_rows: outcome.skipped_rows,
            synthesized: outcome.synthesized,
            lawyers,
        })
    }

    pub fn list(&self, filter: &RosterFilter) -> Result<Vec<StoredLawyer>, RepositoryError> {
        Ok(filter.apply(self.repository.list_all()?))
    }

    pub fn summary(&self, filter: &RosterFilter) -> Result<RosterSummary, RepositoryError> {
        Ok(RosterSummary::from_lawyers(&self.list(filter)?))
    }

    pub fn clear(&self) -> Result<usize, RepositoryError> {
        let cleared = self.repository.clear()?;
        info!(cleared, "lawyer roster cleared");
        Ok(cleared)
    }
}

/// Error raised by the ingest service.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Pipeline(#[from] InputError),
    #[error("every processor failed (remote: {remote}; local: {local})")]
    ProcessorsExhausted {
        remote: RemoteProcessorError,
        local: InputError,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
