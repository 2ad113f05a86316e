use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::pipeline::features::TatFlag;
use crate::pipeline::{FeatureEngineer, LawyerPipeline, LawyerRecord, LawyerScorer, StoredLawyer};
use crate::roster::{
    LawyerIngestService, LawyerRepository, ProcessorFuture, RemoteProcessor,
    RemoteProcessorError, RepositoryError,
};

pub(super) const TWO_LAWYER_CSV: &str = "\
lawyer_id,lawyer_name,branch_name,expertise_domains,cases_assigned,cases_completed,tat_compliance_percent,allocation_status
L1,Asha Rao,Corporate,Tax Law,10,9,95,Allocated
L2,Vikram Shah,Criminal,Criminal Law,10,3,55,Available
L1,Asha Rao,Corporate,Civil Law,10,10,92,Allocated
";

pub(super) fn pipeline() -> LawyerPipeline {
    LawyerPipeline::new(
        FeatureEngineer::new(NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date")),
        LawyerScorer::default(),
    )
}

pub(super) fn build_service() -> (LawyerIngestService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service =
        LawyerIngestService::new(pipeline(), repository.clone()).with_placeholder_seed(Some(7));
    (service, repository)
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    sequence: AtomicU64,
    records: Mutex<Vec<StoredLawyer>>,
}

impl MemoryRepository {
    pub(super) fn stored(&self) -> Vec<StoredLawyer> {
        self.records.lock().expect("repository mutex poisoned").clone()
    }
}

fn fixed_timestamp(offset: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_714_521_600 + offset, 0)
        .single()
        .expect("valid timestamp")
}

impl LawyerRepository for MemoryRepository {
    fn insert(&self, records: Vec<LawyerRecord>) -> Result<Vec<StoredLawyer>, RepositoryError> {
        let stored: Vec<StoredLawyer> = records
            .into_iter()
            .map(|record| {
                let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                StoredLawyer {
                    id: format!("lwr-{id:06}"),
                    created_at: fixed_timestamp(id as i64),
                    record,
                }
            })
            .collect();
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    fn list_all(&self) -> Result<Vec<StoredLawyer>, RepositoryError> {
        let mut records = self.stored();
        records.reverse();
        Ok(records)
    }

    fn clear(&self) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let cleared = guard.len();
        guard.clear();
        Ok(cleared)
    }
}

pub(super) struct UnavailableRepository;

impl LawyerRepository for UnavailableRepository {
    fn insert(&self, _records: Vec<LawyerRecord>) -> Result<Vec<StoredLawyer>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_all(&self) -> Result<Vec<StoredLawyer>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn clear(&self) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Remote processor stub that answers from a fixed script and counts calls.
pub(super) struct ScriptedRemote {
    reply: Result<Vec<LawyerRecord>, String>,
    pub(super) calls: AtomicUsize,
}

impl ScriptedRemote {
    pub(super) fn succeeding(records: Vec<LawyerRecord>) -> Self {
        Self {
            reply: Ok(records),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl RemoteProcessor for ScriptedRemote {
    fn process<'a>(&'a self, _csv: &'a str) -> ProcessorFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .reply
            .clone()
            .map_err(RemoteProcessorError::Transport);
        Box::pin(async move { reply })
    }
}

pub(super) fn remote_record(lawyer_id: &str) -> LawyerRecord {
    LawyerRecord {
        lawyer_id: lawyer_id.to_string(),
        lawyer_name: Some("Remote Lawyer".to_string()),
        branch_name: "Family".to_string(),
        expertise_domains: Some("Family Law".to_string()),
        allocation_month: "2024-05".to_string(),
        case_id: "1".to_string(),
        cases_assigned: 5,
        cases_completed: 5,
        completion_rate: 1.0,
        cases_remaining: 0,
        performance_score: 0.91,
        tat_compliance_percent: 96.0,
        avg_tat_days: 4.0,
        tat_flag: TatFlag::Green,
        quality_check_flag: true,
        client_feedback_score: 4.6,
        feedback_flag: true,
        complaints_per_case: 0.0,
        reworks_per_case: 0.0,
        low_performance_flag: false,
        lawyer_score: 0.91,
        quality_rating: 4.6,
        allocation_status: "Available".to_string(),
        total_cases_ytd: 5,
    }
}

pub(super) fn stored(id: &str, record: LawyerRecord) -> StoredLawyer {
    StoredLawyer {
        id: id.to_string(),
        created_at: fixed_timestamp(0),
        record,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
