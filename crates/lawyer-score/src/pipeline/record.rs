use super::aggregate::AggregatedRecord;
use super::features::{FeedbackFlag, QualityCheck, TatFlag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Externally visible lawyer record handed to storage and presentation.
/// Field names are fixed; the legacy `domain` key is only accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawyerRecord {
    pub lawyer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lawyer_name: Option<String>,
    pub branch_name: String,
    #[serde(default, alias = "domain", skip_serializing_if = "Option::is_none")]
    pub expertise_domains: Option<String>,
    pub allocation_month: String,
    pub case_id: String,
    pub cases_assigned: u64,
    pub cases_completed: u64,
    pub completion_rate: f64,
    pub cases_remaining: u64,
    pub performance_score: f64,
    pub tat_compliance_percent: f64,
    pub avg_tat_days: f64,
    pub tat_flag: TatFlag,
    pub quality_check_flag: bool,
    pub client_feedback_score: f64,
    pub feedback_flag: bool,
    pub complaints_per_case: f64,
    pub reworks_per_case: f64,
    pub low_performance_flag: bool,
    pub lawyer_score: f64,
    pub quality_rating: f64,
    pub allocation_status: String,
    pub total_cases_ytd: u64,
}

/// A record as persisted, with the server-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLawyer {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: LawyerRecord,
}

/// The only `allocation_status` values a [`LawyerRecord`] carries.
pub const PUBLISHED_ALLOCATION_STATUSES: [&str; 4] =
    ["Allocated", "Available", "Pending", "Completed"];

/// Folds any status label onto the published set. Busy lawyers hold cases
/// and publish as Allocated; lawyers on leave publish as Pending; anything
/// unrecognised publishes as Available, matching its integer encoding.
pub fn published_allocation_status(label: &str) -> &'static str {
    let key = label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    match key.as_str() {
        "allocated" | "busy" => "Allocated",
        "pending" | "on leave" => "Pending",
        "completed" => "Completed",
        _ => "Available",
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Ratios and scores keep four decimals; percentages, days and ratings two.
pub fn format_record(aggregated: &AggregatedRecord, score: f64) -> LawyerRecord {
    let score = round_to(score, 4);
    let feedback = round_to(aggregated.client_feedback_score, 2);

    LawyerRecord {
        lawyer_id: aggregated.lawyer_id.clone(),
        lawyer_name: non_empty(&aggregated.lawyer_name),
        branch_name: aggregated.branch_name.clone(),
        expertise_domains: non_empty(&aggregated.expertise_domains),
        allocation_month: aggregated.allocation_month.clone(),
        case_id: aggregated.case_count.to_string(),
        cases_assigned: aggregated.cases_assigned,
        cases_completed: aggregated.cases_completed,
        completion_rate: round_to(aggregated.completion_rate, 4),
        cases_remaining: aggregated.cases_remaining,
        performance_score: score,
        tat_compliance_percent: round_to(aggregated.tat_compliance_percent, 2),
        avg_tat_days: round_to(aggregated.avg_tat_days, 2),
        tat_flag: aggregated.tat_flag,
        quality_check_flag: aggregated.quality_check_flag == QualityCheck::Pass,
        client_feedback_score: feedback,
        feedback_flag: aggregated.feedback_flag == FeedbackFlag::Positive,
        complaints_per_case: round_to(aggregated.complaints_per_case, 4),
        reworks_per_case: round_to(aggregated.reworks_per_case, 4),
        low_performance_flag: aggregated.low_performance_flag,
        lawyer_score: score,
        quality_rating: feedback,
        allocation_status: published_allocation_status(&aggregated.allocation_status).to_string(),
        total_cases_ytd: aggregated.total_cases_ytd,
    }
}
