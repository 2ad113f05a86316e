use super::aggregate::AggregatedRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Aggregated features the scorer knows how to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFeature {
    CompletionRate,
    TatCompliancePercent,
    AvgTatDays,
    ReworksPerCase,
    ComplaintsPerCase,
    CasesRemaining,
    TotalCasesYtd,
    AllocationStatusEncoded,
    ClientFeedbackScore,
    QualityCheckFlag,
    FeedbackFlag,
}

impl ScoreFeature {
    /// Maps the raw aggregated value onto `[0, 1]`, higher is better.
    pub fn normalized(self, record: &AggregatedRecord) -> f64 {
        match self {
            ScoreFeature::CompletionRate => record.completion_rate.clamp(0.0, 1.0),
            ScoreFeature::TatCompliancePercent => (record.tat_compliance_percent / 100.0).min(1.0),
            ScoreFeature::AvgTatDays => (1.0 - record.avg_tat_days / 30.0).max(0.0),
            ScoreFeature::ReworksPerCase => 1.0 - record.reworks_per_case.min(1.0),
            ScoreFeature::ComplaintsPerCase => 1.0 - record.complaints_per_case.min(1.0),
            ScoreFeature::CasesRemaining => (1.0 - record.cases_remaining as f64 / 100.0).max(0.0),
            ScoreFeature::TotalCasesYtd => (record.total_cases_ytd as f64 / 500.0).min(1.0),
            ScoreFeature::AllocationStatusEncoded => {
                f64::from(record.allocation_status_encoded) / 4.0
            }
            ScoreFeature::ClientFeedbackScore => {
                (record.client_feedback_score / 5.0).clamp(0.0, 1.0)
            }
            ScoreFeature::QualityCheckFlag => f64::from(record.quality_check_flag_encoded),
            ScoreFeature::FeedbackFlag => f64::from(record.feedback_flag_encoded),
        }
    }
}

/// Feature weights. Serialized as a plain JSON object keyed by feature name
/// so analysts can retune the table without a rebuild.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreWeights(BTreeMap<ScoreFeature, f64>);

impl ScoreWeights {
    pub fn new(weights: impl IntoIterator<Item = (ScoreFeature, f64)>) -> Self {
        Self(weights.into_iter().collect())
    }

    /// Feature-importance table keyed on completion and turnaround.
    pub fn completion_tat() -> Self {
        Self::new([
            (ScoreFeature::CompletionRate, 0.612067),
            (ScoreFeature::TatCompliancePercent, 0.184235),
            (ScoreFeature::AvgTatDays, 0.166585),
            (ScoreFeature::ReworksPerCase, 0.015159),
            (ScoreFeature::ComplaintsPerCase, 0.010657),
            (ScoreFeature::CasesRemaining, 0.004215),
            (ScoreFeature::TotalCasesYtd, 0.003676),
            (ScoreFeature::AllocationStatusEncoded, 0.003408),
        ])
    }

    /// Blend of completion, timeliness and client feedback.
    pub fn feedback() -> Self {
        Self::new([
            (ScoreFeature::CompletionRate, 0.4),
            (ScoreFeature::TatCompliancePercent, 0.3),
            (ScoreFeature::ClientFeedbackScore, 0.3),
        ])
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn get(&self, feature: ScoreFeature) -> Option<f64> {
        self.0.get(&feature).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreFeature, f64)> + '_ {
        self.0.iter().map(|(feature, weight)| (*feature, *weight))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Built-in weight tables selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreProfile {
    #[default]
    CompletionTat,
    Feedback,
}

impl ScoreProfile {
    pub fn weights(self) -> ScoreWeights {
        match self {
            ScoreProfile::CompletionTat => ScoreWeights::completion_tat(),
            ScoreProfile::Feedback => ScoreWeights::feedback(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreProfile::CompletionTat => "completion_tat",
            ScoreProfile::Feedback => "feedback",
        }
    }
}

impl fmt::Display for ScoreProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreProfile {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "completion_tat" | "completion" | "xgboost" => Ok(ScoreProfile::CompletionTat),
            "feedback" => Ok(ScoreProfile::Feedback),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LawyerScorer {
    weights: ScoreWeights,
}

impl Default for LawyerScorer {
    fn default() -> Self {
        Self::new(ScoreWeights::completion_tat())
    }
}

impl LawyerScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Weighted mean of the normalized features, clamped to `[0, 1]`.
    /// Weights that are not positive finite numbers are ignored; with nothing
    /// left to weigh the score is 0.
    pub fn score(&self, record: &AggregatedRecord) -> f64 {
        let (weighted, total_weight) = self
            .weights
            .iter()
            .filter(|(_, weight)| weight.is_finite() && *weight > 0.0)
            .fold((0.0, 0.0), |(weighted, total), (feature, weight)| {
                (weighted + feature.normalized(record) * weight, total + weight)
            });

        if total_weight <= 0.0 {
            warn!(lawyer_id = %record.lawyer_id, "score weight table is empty, scoring as 0");
            return 0.0;
        }
        (weighted / total_weight).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::aggregate::aggregate_by_lawyer;
    use crate::pipeline::features::FeatureEngineer;
    use crate::pipeline::placeholder::SeededPlaceholders;
    use crate::pipeline::table::RawRow;
    use chrono::NaiveDate;

    fn aggregated(pairs: &[(&str, &str)]) -> AggregatedRecord {
        let engineer =
            FeatureEngineer::new(NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"));
        let row = RawRow::from_pairs(2, pairs.iter().copied());
        let processed = engineer.engineer(&row, &mut SeededPlaceholders::new(5));
        aggregate_by_lawyer(&[processed]).remove(0)
    }

    #[test]
    fn perfect_record_scores_near_one() {
        let record = aggregated(&[
            ("lawyer_id", "L1"),
            ("cases_assigned", "100"),
            ("cases_completed", "100"),
            ("tat_compliance_percent", "100"),
            ("avg_tat_days", "0"),
            ("total_cases_ytd", "500"),
            ("allocation_status", "On Leave"),
        ]);
        let score = LawyerScorer::default().score(&record);
        assert!((score - 1.0).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn scores_stay_within_unit_interval() {
        let scorer = LawyerScorer::default();
        let weak = aggregated(&[
            ("lawyer_id", "L1"),
            ("cases_assigned", "400"),
            ("complaint_count", "900"),
            ("avg_tat_days", "90"),
        ]);
        let score = scorer.score(&weak);
        assert!((0.0..=1.0).contains(&score));
        assert!(score < 0.1);
    }

    #[test]
    fn empty_or_zero_weight_tables_score_zero() {
        let record = aggregated(&[
            ("lawyer_id", "L1"),
            ("cases_assigned", "1"),
            ("cases_completed", "1"),
        ]);
        assert_eq!(LawyerScorer::new(ScoreWeights::default()).score(&record), 0.0);
        let zeroed = ScoreWeights::new([
            (ScoreFeature::CompletionRate, 0.0),
            (ScoreFeature::AvgTatDays, -1.0),
        ]);
        assert_eq!(LawyerScorer::new(zeroed).score(&record), 0.0);
    }

    #[test]
    fn feedback_profile_blends_three_features() {
        let record = aggregated(&[
            ("lawyer_id", "L1"),
            ("cases_assigned", "10"),
            ("cases_completed", "5"),
            ("tat_compliance_percent", "80"),
            ("client_feedback_score", "4"),
        ]);
        let score = LawyerScorer::new(ScoreProfile::Feedback.weights()).score(&record);
        let expected = 0.5 * 0.4 + 0.8 * 0.3 + 0.8 * 0.3;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn weight_tables_load_from_json() {
        let weights =
            ScoreWeights::from_json(r#"{"completion_rate": 0.7, "feedback_flag": 0.3}"#)
                .expect("valid weights");
        assert_eq!(weights.get(ScoreFeature::CompletionRate), Some(0.7));
        assert_eq!(weights.get(ScoreFeature::AvgTatDays), None);
        assert!(ScoreWeights::from_json(r#"{"unknown_feature": 1.0}"#).is_err());
    }

    #[test]
    fn profiles_parse_from_config_text() {
        assert_eq!(
            "completion_tat".parse::<ScoreProfile>(),
            Ok(ScoreProfile::CompletionTat)
        );
        assert_eq!("Feedback".parse::<ScoreProfile>(), Ok(ScoreProfile::Feedback));
        assert!("random".parse::<ScoreProfile>().is_err());
    }
}
