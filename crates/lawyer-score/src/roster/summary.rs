use std::collections::BTreeMap;

use serde::Serialize;

use crate::pipeline::record::round_to;
use crate::pipeline::StoredLawyer;

pub const HIGH_PERFORMER_SCORE: f64 = 0.8;

/// Dashboard headline numbers for a (possibly filtered) roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterSummary {
    pub total_lawyers: usize,
    pub average_score: f64,
    pub high_performers: usize,
    pub low_performance: usize,
    pub allocated: usize,
    pub available: usize,
    pub branches: Vec<BranchSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchSummary {
    pub branch_name: String,
    pub lawyers: usize,
    pub average_score: f64,
}

impl RosterSummary {
    pub fn from_lawyers(lawyers: &[StoredLawyer]) -> Self {
        let mut branches: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        let mut total_score = 0.0;
        let mut high_performers = 0;
        let mut low_performance = 0;
        let mut allocated = 0;
        let mut available = 0;

        for lawyer in lawyers {
            let record = &lawyer.record;
            total_score += record.lawyer_score;
            if record.lawyer_score >= HIGH_PERFORMER_SCORE {
                high_performers += 1;
            }
            if record.low_performance_flag {
                low_performance += 1;
            }
            match record.allocation_status.as_str() {
                "Allocated" => allocated += 1,
                "Available" => available += 1,
                _ => {}
            }

            let entry = branches.entry(record.branch_name.as_str()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += record.lawyer_score;
        }

        Self {
            total_lawyers: lawyers.len(),
            average_score: average(total_score, lawyers.len()),
            high_performers,
            low_performance,
            allocated,
            available,
            branches: branches
                .into_iter()
                .map(|(branch_name, (count, score))| BranchSummary {
                    branch_name: branch_name.to_string(),
                    lawyers: count,
                    average_score: average(score, count),
                })
                .collect(),
        }
    }
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        round_to(total / count as f64, 4)
    }
}
