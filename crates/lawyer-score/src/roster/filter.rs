use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::pipeline::StoredLawyer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[serde(alias = "lawyer_score")]
    Score,
    CompletionRate,
    #[serde(alias = "tat_compliance_percent")]
    TatCompliance,
    CasesAssigned,
    LawyerId,
}

impl SortKey {
    fn default_direction(self) -> SortDirection {
        match self {
            SortKey::LawyerId => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    fn compare(self, left: &StoredLawyer, right: &StoredLawyer) -> Ordering {
        let (left, right) = (&left.record, &right.record);
        match self {
            SortKey::Score => left.lawyer_score.total_cmp(&right.lawyer_score),
            SortKey::CompletionRate => left.completion_rate.total_cmp(&right.completion_rate),
            SortKey::TatCompliance => left
                .tat_compliance_percent
                .total_cmp(&right.tat_compliance_percent),
            SortKey::CasesAssigned => left.cases_assigned.cmp(&right.cases_assigned),
            SortKey::LawyerId => left.lawyer_id.cmp(&right.lawyer_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Roster query: all criteria are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterFilter {
    /// Case-insensitive branch match; `all` or blank disables it.
    pub branch: Option<String>,
    /// `true` keeps only flagged lawyers, `false` only unflagged ones.
    pub low_performance: Option<bool>,
    /// Case-insensitive substring over id, name, branch and domains.
    pub search: Option<String>,
    pub sort: Option<SortKey>,
    pub direction: Option<SortDirection>,
}

impl RosterFilter {
    pub fn matches(&self, lawyer: &StoredLawyer) -> bool {
        let record = &lawyer.record;

        if let Some(branch) = self.branch_filter() {
            if !record.branch_name.trim().eq_ignore_ascii_case(branch) {
                return false;
            }
        }

        if let Some(flagged) = self.low_performance {
            if record.low_performance_flag != flagged {
                return false;
            }
        }

        if let Some(needle) = self.search_needle() {
            let haystacks = [
                Some(record.lawyer_id.as_str()),
                record.lawyer_name.as_deref(),
                Some(record.branch_name.as_str()),
                record.expertise_domains.as_deref(),
            ];
            let hit = haystacks
                .into_iter()
                .flatten()
                .any(|value| value.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        true
    }

    /// Filters and, when a sort key is set, orders the roster. Without a sort
    /// key the incoming order is kept.
    pub fn apply(&self, lawyers: Vec<StoredLawyer>) -> Vec<StoredLawyer> {
        let mut selected: Vec<StoredLawyer> = lawyers
            .into_iter()
            .filter(|lawyer| self.matches(lawyer))
            .collect();

        if let Some(key) = self.sort {
            let direction = self.direction.unwrap_or_else(|| key.default_direction());
            selected.sort_by(|left, right| {
                let ordering = key.compare(left, right);
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        selected
    }

    fn branch_filter(&self) -> Option<&str> {
        self.branch
            .as_deref()
            .map(str::trim)
            .filter(|branch| !branch.is_empty() && !branch.eq_ignore_ascii_case("all"))
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase)
    }
}
