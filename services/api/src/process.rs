use clap::Args;
use lawyer_score::config::AppConfig;
use lawyer_score::error::AppError;
use lawyer_score::pipeline::{
    FeatureEngineer, LawyerPipeline, LawyerRecord, LawyerScorer, PipelineOutput,
    SeededPlaceholders,
};
use std::cmp::Ordering;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ProcessArgs {
    /// CSV export to score (comma, semicolon, or tab delimited)
    pub(crate) path: PathBuf,
    /// Fix placeholder generation for rows missing ids or names
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Print the full pipeline output as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
    /// Score generated sample rows when the file only has a header
    #[arg(long)]
    pub(crate) include_samples: bool,
}

pub(crate) fn run_process(args: ProcessArgs) -> Result<(), AppError> {
    let ProcessArgs {
        path,
        seed,
        json,
        include_samples,
    } = args;

    let config = AppConfig::load()?;
    let content = std::fs::read_to_string(&path)?;

    let pipeline = LawyerPipeline::new(
        FeatureEngineer::for_today(),
        LawyerScorer::new(config.pipeline.weights.clone()),
    )
    .with_sample_synthesis(include_samples || config.pipeline.sample_on_empty);

    let mut placeholders = match seed.or(config.pipeline.placeholder_seed) {
        Some(seed) => SeededPlaceholders::new(seed),
        None => SeededPlaceholders::from_clock(),
    };
    let output = pipeline.run(&content, &mut placeholders)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render_table(&output));
    }
    Ok(())
}

fn ranked(records: &[LawyerRecord]) -> Vec<&LawyerRecord> {
    let mut ranked: Vec<&LawyerRecord> = records.iter().collect();
    ranked.sort_by(|left, right| {
        right
            .lawyer_score
            .partial_cmp(&left.lawyer_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.lawyer_id.cmp(&right.lawyer_id))
    });
    ranked
}

fn render_table(output: &PipelineOutput) -> String {
    let mut rendered = String::new();
    if output.synthesized {
        rendered.push_str("No data rows found; scored generated sample lawyers.\n");
    }
    rendered.push_str(&format!(
        "{:<4} {:<14} {:<22} {:<14} {:>7} {:>10} {:>7}  {}\n",
        "Rank", "Lawyer", "Name", "Branch", "Score", "Completion", "TAT %", "Flags"
    ));

    for (index, record) in ranked(&output.records).into_iter().enumerate() {
        let flags = if record.low_performance_flag {
            "low-performance"
        } else {
            ""
        };
        rendered.push_str(&format!(
            "{:<4} {:<14} {:<22} {:<14} {:>7.4} {:>10.2} {:>7.2}  {}\n",
            index + 1,
            record.lawyer_id,
            record.lawyer_name.as_deref().unwrap_or("-"),
            record.branch_name,
            record.lawyer_score,
            record.completion_rate,
            record.tat_compliance_percent,
            flags
        ));
    }

    rendered.push_str(&format!(
        "\n{} lawyers from {} rows ({} skipped)\n",
        output.records.len(),
        output.rows_processed,
        output.rows_skipped()
    ));
    for skipped in &output.skipped_rows {
        rendered.push_str(&format!("  skipped {skipped}\n"));
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const EXPORT: &str = "\
lawyer_id;lawyer_name;branch_name;cases_assigned;cases_completed;tat_compliance_percent
L2;Vikram Shah;Criminal;10;3;55
L1;Asha Rao;Corporate;10;9;95
L3;Meera Iyer;Family;not-a-number;\"unterminated
";

    fn output() -> PipelineOutput {
        let pipeline = LawyerPipeline::new(
            FeatureEngineer::new(NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date")),
            LawyerScorer::default(),
        );
        pipeline
            .run(EXPORT, &mut SeededPlaceholders::new(11))
            .expect("pipeline runs")
    }

    #[test]
    fn table_ranks_by_score_and_flags_low_performers() {
        let rendered = render_table(&output());
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines[0].starts_with("Rank"));
        assert!(lines[1].starts_with("1    L1"));
        assert!(lines[2].starts_with("2    L2"));
        assert!(lines[2].ends_with("low-performance"));
    }

    #[test]
    fn table_footer_counts_skipped_rows() {
        let output = output();
        let rendered = render_table(&output);

        let expected = format!(
            "{} lawyers from {} rows ({} skipped)",
            output.records.len(),
            output.rows_processed,
            output.rows_skipped()
        );
        assert!(rendered.contains(&expected));
        assert!(rendered.contains(
            "skipped row 4: malformed delimited record: unterminated quoted field"
        ));
    }
}
