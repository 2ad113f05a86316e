use super::table::RawRow;

/// Logical columns the feature engineer knows how to read. Upload headers are
/// never trusted to be canonical, so every lookup goes through [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    LawyerId,
    LawyerName,
    ExpertiseDomains,
    BranchName,
    AllocationMonth,
    AllocationDate,
    CaseId,
    CasesAssigned,
    CasesCompleted,
    ComplaintCount,
    ReworkCount,
    ComplaintsPerCase,
    ReworksPerCase,
    TatCompliancePercent,
    AvgTatDays,
    ClientFeedbackScore,
    TatFlag,
    TatBucket,
    QualityFlags,
    QualityCheckFlag,
    FeedbackFlag,
    AllocationStatus,
    QualityRating,
    BlacklistStatus,
    MaxCapacity,
    TotalCasesYtd,
}

impl Field {
    /// Header spellings in priority order, most canonical first.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Field::LawyerId => &["lawyer_id", "Lawyer_ID", "Lawyer ID", "LawyerID", "Lawyer_Id"],
            Field::LawyerName => &[
                "lawyer_name",
                "Lawyer_Name",
                "Lawyer Name",
                "name",
                "Name",
                "LawyerName",
                "lawyer",
                "Lawyer",
                "attorney_name",
                "Attorney_Name",
            ],
            Field::ExpertiseDomains => &[
                "expertise_domains",
                "Expertise_Domains",
                "Expertise Domains",
                "expertise_domain",
                "Expertise_Domain",
                "Expertise Domain",
                "domain",
                "Domain",
                "specialization",
                "Specialization",
                "practice_area",
                "Practice_Area",
                "Practice Area",
                "area_of_expertise",
                "Area_of_Expertise",
                "Area of Expertise",
                "legal_domain",
                "Legal_Domain",
                "Legal Domain",
                "practice_areas",
                "Practice_Areas",
                "Practice Areas",
                "specialty",
                "Specialty",
                "field",
                "Field",
                "area",
                "Area",
            ],
            Field::BranchName => &["branch_name", "Branch_Name", "Branch Name", "branch", "Branch"],
            Field::AllocationMonth => &["allocation_month", "Allocation_Month", "Allocation Month"],
            Field::AllocationDate => &["allocation_date", "Allocation_Date", "Allocation Date"],
            Field::CaseId => &["case_id", "Case_ID", "Case ID", "CaseID"],
            Field::CasesAssigned => &["cases_assigned", "Cases_Assigned", "Cases Assigned"],
            Field::CasesCompleted => &["cases_completed", "Cases_Completed", "Cases Completed"],
            Field::ComplaintCount => &[
                "complaint_count",
                "Complaint_Count",
                "Complaint Count",
                "total_complaints",
                "Total_Complaints",
                "Total Complaints",
            ],
            Field::ReworkCount => &[
                "rework_count",
                "Rework_Count",
                "Rework Count",
                "total_reworks",
                "Total_Reworks",
                "Total Reworks",
            ],
            Field::ComplaintsPerCase => &[
                "complaints_per_case",
                "Complaints_Per_Case",
                "Complaints Per Case",
            ],
            Field::ReworksPerCase => &["reworks_per_case", "Reworks_Per_Case", "Reworks Per Case"],
            Field::TatCompliancePercent => &[
                "tat_compliance_percent",
                "TAT_Compliance_Percent",
                "TAT Compliance Percent",
                "tat_compliance",
                "TAT Compliance",
            ],
            Field::AvgTatDays => &["avg_tat_days", "Avg_TAT_Days", "Avg TAT Days", "Average TAT Days"],
            Field::ClientFeedbackScore => &[
                "client_feedback_score",
                "Client_Feedback_Score",
                "Client Feedback Score",
                "avg_client_feedback_score",
                "Avg_Client_Feedback_Score",
                "Avg Client Feedback Score",
            ],
            Field::TatFlag => &["tat_flag", "TAT_Flag", "TAT Flag"],
            Field::TatBucket => &["tat_bucket", "TAT_Bucket", "TAT Bucket"],
            Field::QualityFlags => &["quality_flags", "Quality_Flags", "Quality Flags"],
            Field::QualityCheckFlag => &[
                "quality_check_flag",
                "Quality_Check_Flag",
                "Quality Check Flag",
            ],
            Field::FeedbackFlag => &["feedback_flag", "Feedback_Flag", "Feedback Flag"],
            Field::AllocationStatus => &[
                "allocation_status",
                "Allocation_Status",
                "Allocation Status",
            ],
            Field::QualityRating => &["quality_rating", "Quality_Rating", "Quality Rating"],
            Field::BlacklistStatus => &["blacklist_status", "Blacklist_Status", "Blacklist Status"],
            Field::MaxCapacity => &["max_capacity", "Max_Capacity", "Max Capacity"],
            Field::TotalCasesYtd => &[
                "total_cases_ytd",
                "Total_Cases_YTD",
                "Total Cases YTD",
                "Total_Cases_Ytd",
            ],
        }
    }
}

/// Value of the first candidate header holding a non-blank value, trimmed.
pub fn resolve(row: &RawRow, field: Field) -> Option<&str> {
    resolve_candidates(row, field.candidates())
}

/// Exact header matches are tried first, in candidate order. Only when none of
/// them carries a value are headers compared loosely (case, spaces and
/// separators ignored), again in candidate order.
pub fn resolve_candidates<'r>(row: &'r RawRow, candidates: &[&str]) -> Option<&'r str> {
    let exact = candidates
        .iter()
        .filter_map(|candidate| row.get(candidate))
        .map(str::trim)
        .find(|value| !value.is_empty());
    if exact.is_some() {
        return exact;
    }

    candidates.iter().find_map(|candidate| {
        row.cells()
            .filter(|(header, _)| headers_match(header, candidate))
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
    })
}

pub(crate) fn headers_match(left: &str, right: &str) -> bool {
    fn folded(value: &str) -> impl Iterator<Item = char> + '_ {
        value
            .chars()
            .filter(|ch| ch.is_alphanumeric())
            .flat_map(char::to_lowercase)
    }

    folded(left).eq(folded(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_first_non_empty_candidate_in_priority_order() {
        let row = RawRow::from_pairs(
            2,
            [("lawyer_name", "   "), ("Lawyer Name", "Asha Rao"), ("name", "ignored")],
        );
        assert_eq!(resolve(&row, Field::LawyerName), Some("Asha Rao"));
    }

    #[test]
    fn missing_fields_are_not_found_rather_than_empty() {
        let row = RawRow::from_pairs(2, [("branch_name", "")]);
        assert_eq!(resolve(&row, Field::BranchName), None);
        assert_eq!(resolve(&row, Field::LawyerId), None);
    }

    #[test]
    fn loosely_spelled_headers_still_resolve() {
        let row = RawRow::from_pairs(2, [("CASES-ASSIGNED", " 12 "), ("tat compliance percent", "88")]);
        assert_eq!(resolve(&row, Field::CasesAssigned), Some("12"));
        assert_eq!(resolve(&row, Field::TatCompliancePercent), Some("88"));
    }

    #[test]
    fn exact_match_beats_loose_match_of_higher_priority() {
        let row = RawRow::from_pairs(2, [("LAWYER_NAME", "Loose"), ("Name", "Exact")]);
        assert_eq!(resolve(&row, Field::LawyerName), Some("Exact"));
    }

    #[test]
    fn legacy_domain_header_feeds_expertise_domains() {
        let row = RawRow::from_pairs(2, [("domain", "Tax Law")]);
        assert_eq!(resolve(&row, Field::ExpertiseDomains), Some("Tax Law"));
    }

    #[test]
    fn header_folding_ignores_case_and_separators() {
        assert!(headers_match("Avg_TAT_Days", "avg tat days"));
        assert!(headers_match("\u{feff}LawyerID", "lawyer_id"));
        assert!(!headers_match("lawyer_id", "lawyer_name"));
    }
}
