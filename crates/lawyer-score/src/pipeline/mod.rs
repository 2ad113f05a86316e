//! CSV-to-score pipeline: parse, engineer features per row, aggregate per
//! lawyer, score, format. Every stage is synchronous and pure over its input;
//! randomness only enters through [`PlaceholderSource`].

pub mod aggregate;
pub mod error;
pub mod features;
pub mod fields;
pub mod placeholder;
pub mod record;
pub mod sample;
pub mod scoring;
pub mod table;

pub use aggregate::{aggregate_by_lawyer, AggregatedRecord};
pub use error::{InputError, RowError, RowErrorKind};
pub use features::{FeatureEngineer, ProcessedRecord};
pub use placeholder::{PlaceholderSource, SeededPlaceholders};
pub use record::{
    format_record, published_allocation_status, LawyerRecord, StoredLawyer,
    PUBLISHED_ALLOCATION_STATUSES,
};
pub use scoring::{LawyerScorer, ScoreFeature, ScoreProfile, ScoreWeights};
pub use table::{parse_table, Delimiter, ParsedTable, RawRow};

use serde::Serialize;
use tracing::{info, warn};

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub records: Vec<LawyerRecord>,
    pub rows_processed: usize,
    pub skipped_rows: Vec<RowError>,
    /// True when the upload only had a header and sample rows were scored.
    pub synthesized: bool,
}

impl PipelineOutput {
    pub fn rows_skipped(&self) -> usize {
        self.skipped_rows.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LawyerPipeline {
    engineer: FeatureEngineer,
    scorer: LawyerScorer,
    synthesize_samples: bool,
}

impl Default for LawyerPipeline {
    fn default() -> Self {
        Self::new(FeatureEngineer::for_today(), LawyerScorer::default())
    }
}

impl LawyerPipeline {
    pub fn new(engineer: FeatureEngineer, scorer: LawyerScorer) -> Self {
        Self {
            engineer,
            scorer,
            synthesize_samples: false,
        }
    }

    /// Answer header-only uploads with generated sample rows instead of
    /// [`InputError::NoDataRows`].
    pub fn with_sample_synthesis(mut self, enabled: bool) -> Self {
        self.synthesize_samples = enabled;
        self
    }

    pub fn scorer(&self) -> &LawyerScorer {
        &self.scorer
    }

    pub fn run(
        &self,
        content: &str,
        source: &mut dyn PlaceholderSource,
    ) -> Result<PipelineOutput, InputError> {
        let table = match parse_table(content) {
            Ok(table) => table,
            Err(InputError::NoDataRows) if self.synthesize_samples => {
                info!("csv has only a header row, scoring generated sample rows");
                let rows = sample::generate_sample_rows(sample::SAMPLE_ROW_COUNT, source);
                let mut output = self.run_rows(&rows, Vec::new(), source)?;
                output.synthesized = true;
                return Ok(output);
            }
            Err(err) => return Err(err),
        };

        self.run_rows(&table.rows, table.malformed, source)
    }

    /// Runs every stage after parsing. Blank rows join `skipped` as row errors.
    pub fn run_rows(
        &self,
        rows: &[RawRow],
        mut skipped: Vec<RowError>,
        source: &mut dyn PlaceholderSource,
    ) -> Result<PipelineOutput, InputError> {
        let mut processed = Vec::with_capacity(rows.len());
        for row in rows {
            if row.is_blank() {
                warn!(row = row.row_number(), "skipping row with no values");
                skipped.push(RowError {
                    row_number: row.row_number(),
                    kind: RowErrorKind::Blank,
                });
                continue;
            }
            processed.push(self.engineer.engineer(row, source));
        }

        if processed.is_empty() {
            return Err(InputError::NoValidRows {
                skipped: skipped.len(),
            });
        }

        let records: Vec<LawyerRecord> = aggregate_by_lawyer(&processed)
            .iter()
            .map(|aggregated| format_record(aggregated, self.scorer.score(aggregated)))
            .collect();

        skipped.sort_by_key(|error| error.row_number);
        info!(
            rows_processed = processed.len(),
            rows_skipped = skipped.len(),
            lawyers = records.len(),
            "csv pipeline completed"
        );

        Ok(PipelineOutput {
            records,
            rows_processed: processed.len(),
            skipped_rows: skipped,
            synthesized: false,
        })
    }
}
