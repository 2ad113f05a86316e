use crate::config::RemoteProcessorConfig;
use crate::pipeline::{published_allocation_status, LawyerRecord};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;

pub type ProcessorFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<LawyerRecord>, RemoteProcessorError>> + Send + 'a>>;

/// A processor living outside this process that turns raw CSV into lawyer
/// records. Tried before the local pipeline when configured.
pub trait RemoteProcessor: Send + Sync {
    fn process<'a>(&'a self, csv: &'a str) -> ProcessorFuture<'a>;
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteProcessorError {
    #[error("remote processor unreachable: {0}")]
    Transport(String),
    #[error("remote processor answered {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("remote processor response could not be decoded: {0}")]
    Decode(String),
    #[error("remote processor returned no records")]
    Empty,
}

/// Remote processor reached over HTTP. The CSV is posted as `text/csv`; the
/// reply is either a bare record array or an object with a `records` array
/// (the shape served by `/api/v1/lawyers/preview`).
#[derive(Debug, Clone)]
pub struct HttpRemoteProcessor {
    client: reqwest::Client,
    url: String,
}

impl HttpRemoteProcessor {
    pub fn new(config: &RemoteProcessorConfig) -> Result<Self, RemoteProcessorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| RemoteProcessorError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, csv: &str) -> Result<Vec<LawyerRecord>, RemoteProcessorError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, mime::TEXT_CSV_UTF_8.as_ref())
            .body(csv.to_owned())
            .send()
            .await
            .map_err(|err| RemoteProcessorError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteProcessorError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let payload: RemotePayload = response
            .json()
            .await
            .map_err(|err| RemoteProcessorError::Decode(err.to_string()))?;

        let records = payload.into_records();
        if records.is_empty() {
            return Err(RemoteProcessorError::Empty);
        }
        Ok(records)
    }
}

impl RemoteProcessor for HttpRemoteProcessor {
    fn process<'a>(&'a self, csv: &'a str) -> ProcessorFuture<'a> {
        Box::pin(self.post(csv))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemotePayload {
    Bare(Vec<LawyerRecord>),
    Wrapped { records: Vec<LawyerRecord> },
}

impl RemotePayload {
    /// Remote statuses pass through the same published set as local ones.
    fn into_records(self) -> Vec<LawyerRecord> {
        let (RemotePayload::Bare(mut records) | RemotePayload::Wrapped { mut records }) = self;
        for record in &mut records {
            record.allocation_status =
                published_allocation_status(&record.allocation_status).to_string();
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_json(key: &str) -> serde_json::Value {
        json!({
            "lawyer_id": "R1",
            "branch_name": "Corporate",
            key: "Tax Law",
            "allocation_month": "2024-05",
            "case_id": "1",
            "cases_assigned": 4,
            "cases_completed": 4,
            "completion_rate": 1.0,
            "cases_remaining": 0,
            "performance_score": 0.9,
            "tat_compliance_percent": 95.0,
            "avg_tat_days": 3.0,
            "tat_flag": "Green",
            "quality_check_flag": true,
            "client_feedback_score": 4.5,
            "feedback_flag": true,
            "complaints_per_case": 0.0,
            "reworks_per_case": 0.0,
            "low_performance_flag": false,
            "lawyer_score": 0.9,
            "quality_rating": 4.5,
            "allocation_status": "Allocated",
            "total_cases_ytd": 4
        })
    }

    #[test]
    fn decodes_bare_and_wrapped_payloads() {
        let bare: RemotePayload =
            serde_json::from_value(json!([record_json("expertise_domains")])).expect("bare");
        assert_eq!(bare.into_records().len(), 1);

        let wrapped: RemotePayload = serde_json::from_value(json!({
            "records": [record_json("domain")],
            "rows_processed": 1
        }))
        .expect("wrapped");
        let records = wrapped.into_records();
        assert_eq!(records[0].expertise_domains.as_deref(), Some("Tax Law"));
        assert_eq!(records[0].lawyer_name, None);
    }

    #[test]
    fn remote_statuses_are_folded_onto_the_published_set() {
        let mut record = record_json("expertise_domains");
        record["allocation_status"] = json!("On Leave");

        let payload: RemotePayload = serde_json::from_value(json!([record])).expect("bare");

        assert_eq!(payload.into_records()[0].allocation_status, "Pending");
    }
}
