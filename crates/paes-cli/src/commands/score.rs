//! The `paes score` command.

use std::path::PathBuf;

use anyhow::Result;

use paes_core::model::SessionStatus;
use paes_core::parser;
use paes_core::ScoringEngine;
use paes_report::{generate_markdown, write_html_report};
use paes_store::load_config_from;

use super::{parse_now, print_summary};

pub fn execute(
    exam_path: PathBuf,
    session_path: PathBuf,
    now: Option<String>,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let now = parse_now(now.as_deref())?;

    let exam = parser::parse_exam(&exam_path)?;
    let session = parser::load_session(&session_path)?;

    if matches!(
        session.status,
        SessionStatus::NotStarted | SessionStatus::Abandoned
    ) {
        anyhow::bail!(
            "session {} is {} and cannot be scored",
            session.id,
            session.status
        );
    }

    let engine = ScoringEngine::new(config.scoring.clone());
    let results = engine.compute_results(&session, &exam, now)?;

    print_summary(&results);

    let output = output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)?;

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "markdown"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("results-{}.json", results.session_id));
                results.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("results-{}.html", results.session_id));
                write_html_report(&results, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("results-{}.md", results.session_id));
                std::fs::write(&path, generate_markdown(&results))?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}
