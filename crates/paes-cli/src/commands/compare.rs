//! The `paes compare` command.

use std::path::PathBuf;

use anyhow::Result;

use paes_core::results::ExamResults;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_decline: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = ExamResults::load_json(&baseline_path)?;
    let current = ExamResults::load_json(&current_path)?;

    if baseline.exam_id != current.exam_id {
        tracing::warn!(
            baseline = %baseline.exam_id,
            current = %current.exam_id,
            "comparing results from different exams"
        );
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Overall: {}% -> {}% ({:+.0} pts)",
                report.baseline_percentage, report.current_percentage, report.overall_delta
            );
            println!(
                "Comparison: {} declines, {} improvements, {} unchanged",
                report.declines.len(),
                report.improvements.len(),
                report.unchanged
            );

            if !report.declines.is_empty() {
                println!("\nDeclines:");
                for d in &report.declines {
                    println!(
                        "  {} {}% -> {}% ({:+.0} pts)",
                        d.area, d.baseline_percentage, d.current_percentage, d.delta
                    );
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!(
                        "  {} {}% -> {}% ({:+.0} pts)",
                        i.area, i.baseline_percentage, i.current_percentage, i.delta
                    );
                }
            }
        }
    }

    if fail_on_decline && report.has_declines() {
        std::process::exit(1);
    }

    Ok(())
}
