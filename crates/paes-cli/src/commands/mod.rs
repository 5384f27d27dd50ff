pub mod compare;
pub mod finish;
pub mod init;
pub mod score;
pub mod validate;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Table};

use paes_core::results::ExamResults;

/// Parse `--now`, falling back to the current time.
pub fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .with_context(|| format!("invalid --now timestamp '{raw}', expected RFC 3339")),
        None => Ok(Utc::now()),
    }
}

/// Print the per-subject score table and overall line.
pub fn print_summary(results: &ExamResults) {
    let mut table = Table::new();
    table.set_header(vec!["Asignatura", "Correctas", "%", "Tiempo (s)"]);

    for (subject, score) in results.subject_scores.iter().filter(|(_, s)| s.total > 0) {
        table.add_row(vec![
            Cell::new(subject.display_name()),
            Cell::new(format!("{}/{}", score.score, score.total)),
            Cell::new(format!("{}%", score.percentage)),
            Cell::new(score.time_spent),
        ]);
    }

    println!("{table}");
    println!(
        "Total: {}/{} ({}%) | session {} | {} recommendation(s)",
        results.correct_answers,
        results.total_questions,
        results.percentage,
        results.session_id,
        results.recommendations.len()
    );
}
