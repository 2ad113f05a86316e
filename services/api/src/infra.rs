use chrono::Utc;
use lawyer_score::pipeline::{LawyerRecord, StoredLawyer};
use lawyer_score::roster::{LawyerRepository, RepositoryError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local roster. Uploads accumulate until cleared; lost on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLawyerRepository {
    sequence: Arc<AtomicU64>,
    records: Arc<Mutex<Vec<StoredLawyer>>>,
}

impl InMemoryLawyerRepository {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<StoredLawyer>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("roster mutex poisoned".to_string()))
    }
}

impl LawyerRepository for InMemoryLawyerRepository {
    fn insert(&self, records: Vec<LawyerRecord>) -> Result<Vec<StoredLawyer>, RepositoryError> {
        let created_at = Utc::now();
        let stored: Vec<StoredLawyer> = records
            .into_iter()
            .map(|record| {
                let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                StoredLawyer {
                    id: format!("lwr-{id:06}"),
                    created_at,
                    record,
                }
            })
            .collect();

        self.lock()?.extend(stored.iter().cloned());
        Ok(stored)
    }

    fn list_all(&self) -> Result<Vec<StoredLawyer>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.iter().rev().cloned().collect())
    }

    fn clear(&self) -> Result<usize, RepositoryError> {
        let mut guard = self.lock()?;
        let cleared = guard.len();
        guard.clear();
        Ok(cleared)
    }
}
