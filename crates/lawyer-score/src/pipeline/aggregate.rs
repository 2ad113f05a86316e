use super::features::{FeedbackFlag, ProcessedRecord, QualityCheck, TatFlag};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// One lawyer after all of their rows have been reduced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRecord {
    pub lawyer_id: String,
    pub lawyer_name: String,
    pub expertise_domains: String,
    pub branch_name: String,
    pub allocation_month: String,
    pub allocation_date: Option<NaiveDate>,
    pub allocation_month_num: u32,
    /// Number of source rows in the group.
    pub case_count: usize,
    pub cases_assigned: u64,
    pub cases_completed: u64,
    pub cases_remaining: u64,
    pub complaint_count: u64,
    pub rework_count: u64,
    pub quality_flags: u64,
    pub completion_rate: f64,
    pub tat_compliance_percent: f64,
    pub avg_tat_days: f64,
    pub client_feedback_score: f64,
    pub complaints_per_case: f64,
    pub reworks_per_case: f64,
    pub tat_flag: TatFlag,
    pub tat_bucket: String,
    pub quality_check_flag: QualityCheck,
    pub feedback_flag: FeedbackFlag,
    pub allocation_status: String,
    pub quality_rating: String,
    pub tat_flag_encoded: u8,
    pub quality_check_flag_encoded: u8,
    pub feedback_flag_encoded: u8,
    pub allocation_status_encoded: u8,
    pub low_performance_flag: bool,
    pub blacklist_status: bool,
    pub max_capacity: u64,
    pub total_cases_ytd: u64,
}

/// Groups rows by `lawyer_id` and reduces each group with the fixed per-field
/// rules. Output keeps the order in which each id was first seen.
pub fn aggregate_by_lawyer(records: &[ProcessedRecord]) -> Vec<AggregatedRecord> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&ProcessedRecord>> = Vec::new();

    for record in records {
        let slot = *index.entry(record.lawyer_id.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(record);
    }

    groups
        .iter()
        .filter_map(|rows| reduce_group(rows))
        .collect()
}

fn reduce_group(rows: &[&ProcessedRecord]) -> Option<AggregatedRecord> {
    let first = *rows.first()?;

    Some(AggregatedRecord {
        lawyer_id: first.lawyer_id.clone(),
        lawyer_name: first.lawyer_name.clone(),
        expertise_domains: union_domains(rows.iter().map(|row| row.expertise_domains.as_str())),
        branch_name: first.branch_name.clone(),
        allocation_month: first.allocation_month.clone(),
        allocation_date: rows.iter().filter_map(|row| row.allocation_date).max(),
        allocation_month_num: first.allocation_month_num,
        case_count: rows.len(),
        cases_assigned: total(rows.iter().map(|row| row.cases_assigned)),
        cases_completed: total(rows.iter().map(|row| row.cases_completed)),
        cases_remaining: total(rows.iter().map(|row| row.cases_remaining)),
        complaint_count: total(rows.iter().map(|row| row.complaint_count)),
        rework_count: total(rows.iter().map(|row| row.rework_count)),
        quality_flags: total(rows.iter().map(|row| row.quality_flags)),
        completion_rate: mean(rows.iter().map(|row| row.completion_rate)),
        tat_compliance_percent: mean(rows.iter().map(|row| row.tat_compliance_percent)),
        avg_tat_days: mean(rows.iter().map(|row| row.avg_tat_days)),
        client_feedback_score: mean(rows.iter().map(|row| row.client_feedback_score)),
        complaints_per_case: mean(rows.iter().map(|row| row.complaints_per_case)),
        reworks_per_case: mean(rows.iter().map(|row| row.reworks_per_case)),
        tat_flag: mode(rows.iter().map(|row| row.tat_flag)).unwrap_or(first.tat_flag),
        tat_bucket: mode_str(rows.iter().map(|row| row.tat_bucket.as_str()), &first.tat_bucket),
        quality_check_flag: mode(rows.iter().map(|row| row.quality_check_flag))
            .unwrap_or(first.quality_check_flag),
        feedback_flag: mode(rows.iter().map(|row| row.feedback_flag))
            .unwrap_or(first.feedback_flag),
        allocation_status: mode_str(
            rows.iter().map(|row| row.allocation_status.as_str()),
            &first.allocation_status,
        ),
        quality_rating: mode_str(
            rows.iter().map(|row| row.quality_rating.as_str()),
            &first.quality_rating,
        ),
        tat_flag_encoded: rounded_mean(rows.iter().map(|row| row.tat_flag.encoded())),
        quality_check_flag_encoded: rounded_mean(
            rows.iter().map(|row| row.quality_check_flag.encoded()),
        ),
        feedback_flag_encoded: rounded_mean(rows.iter().map(|row| row.feedback_flag.encoded())),
        allocation_status_encoded: rounded_mean(
            rows.iter().map(|row| row.allocation_status_encoded),
        ),
        low_performance_flag: rows.iter().any(|row| row.low_performance_flag),
        blacklist_status: rows.iter().any(|row| row.blacklist_status),
        max_capacity: first.max_capacity,
        total_cases_ytd: mean(rows.iter().map(|row| row.total_cases_ytd as f64)).round() as u64,
    })
}

/// Splits every value on commas, drops blanks and duplicates, and joins the
/// sorted remainder with `", "`.
pub fn union_domains<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let domains: BTreeSet<&str> = values
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .collect();
    domains.into_iter().collect::<Vec<_>>().join(", ")
}

/// Counts stop at `u64::MAX` instead of wrapping.
fn total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (total, count) = values.fold((0.0, 0usize), |(total, count), value| {
        (total + value, count + 1)
    });
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

fn rounded_mean(values: impl Iterator<Item = u8>) -> u8 {
    mean(values.map(f64::from)).round() as u8
}

/// Most frequent value; among equally frequent values the first one seen wins.
pub fn mode<T: PartialEq>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut tally: Vec<(T, usize)> = Vec::new();
    for value in values {
        match tally.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => tally.push((value, 1)),
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in tally {
        if best.as_ref().map_or(true, |(_, top)| count > *top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

fn mode_str<'a>(values: impl Iterator<Item = &'a str>, fallback: &str) -> String {
    mode(values).unwrap_or(fallback).to_string()
}
