use super::placeholder::{pick, placeholder_domain, unit_interval, PlaceholderSource};
use super::table::RawRow;

pub const SAMPLE_ROW_COUNT: usize = 5;

const SAMPLE_BRANCHES: [&str; 4] = ["Corporate", "Criminal", "Family", "Commercial"];
const SAMPLE_STATUSES: [&str; 2] = ["Available", "Allocated"];

/// Synthesizes plausible rows for a header-only upload. They pass through the
/// normal feature engineering path like any uploaded row.
pub fn generate_sample_rows(count: usize, source: &mut dyn PlaceholderSource) -> Vec<RawRow> {
    (0..count)
        .map(|index| sample_row(index, source))
        .collect()
}

fn sample_row(index: usize, source: &mut dyn PlaceholderSource) -> RawRow {
    let assigned = 10 + (unit_interval(source) * 50.0).floor() as u64;
    let completed = (assigned as f64 * (0.6 + unit_interval(source) * 0.3)).floor() as u64;
    let tat_compliance = 0.6 + unit_interval(source) * 0.4;
    let feedback = 3.0 + unit_interval(source) * 2.0;
    let avg_tat_days = 5.0 + unit_interval(source) * 20.0;
    let complaints_per_case = unit_interval(source) * 0.2;
    let reworks_per_case = unit_interval(source) * 0.3;
    let ytd_multiplier = 3 + (unit_interval(source) * 3.0).floor() as u64;
    let branch = *pick(&SAMPLE_BRANCHES, source);
    let status = *pick(&SAMPLE_STATUSES, source);
    let domain = placeholder_domain(source);
    let ordinal = index + 1;

    RawRow::from_pairs(
        index + 2,
        [
            ("lawyer_id", format!("SAMPLE-{ordinal:03}")),
            ("lawyer_name", format!("Sample Lawyer {ordinal}")),
            ("expertise_domains", domain.to_string()),
            ("branch_name", branch.to_string()),
            ("cases_assigned", assigned.to_string()),
            ("cases_completed", completed.to_string()),
            ("tat_compliance_percent", format!("{tat_compliance:.4}")),
            ("client_feedback_score", format!("{feedback:.2}")),
            ("avg_tat_days", format!("{avg_tat_days:.2}")),
            ("complaints_per_case", format!("{complaints_per_case:.4}")),
            ("reworks_per_case", format!("{reworks_per_case:.4}")),
            ("allocation_status", status.to_string()),
            ("total_cases_ytd", (assigned * ytd_multiplier).to_string()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::features::{parse_number, FeatureEngineer};
    use crate::pipeline::fields::{resolve, Field};
    use crate::pipeline::placeholder::SeededPlaceholders;
    use chrono::NaiveDate;

    #[test]
    fn generates_requested_number_of_distinct_lawyers() {
        let rows = generate_sample_rows(SAMPLE_ROW_COUNT, &mut SeededPlaceholders::new(8));
        assert_eq!(rows.len(), 5);
        let ids: Vec<_> = rows
            .iter()
            .filter_map(|row| resolve(row, Field::LawyerId))
            .collect();
        assert_eq!(ids, ["SAMPLE-001", "SAMPLE-002", "SAMPLE-003", "SAMPLE-004", "SAMPLE-005"]);
        assert_eq!(rows[0].row_number(), 2);
    }

    #[test]
    fn jittered_values_stay_in_their_ranges() {
        let rows = generate_sample_rows(20, &mut SeededPlaceholders::new(21));
        let engineer =
            FeatureEngineer::new(NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"));
        let mut source = SeededPlaceholders::new(0);

        for row in &rows {
            let assigned = resolve(row, Field::CasesAssigned)
                .and_then(parse_number)
                .expect("assigned");
            assert!((10.0..60.0).contains(&assigned));

            let record = engineer.engineer(row, &mut source);
            assert!(record.completion_rate >= 0.5 && record.completion_rate <= 0.9);
            assert!((60.0..=100.0).contains(&record.tat_compliance_percent));
            assert!((3.0..=5.0).contains(&record.client_feedback_score));
            assert!(SAMPLE_BRANCHES.contains(&record.branch_name.as_str()));
        }
    }
}
