//! The `paes finish` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use paes_core::results::ExamResults;
use paes_core::session::FinishObserver;
use paes_core::SessionError;
use paes_store::{create_service, load_config_from};

use super::{parse_now, print_summary};

/// Console progress reporter.
struct ConsoleObserver;

impl FinishObserver for ConsoleObserver {
    fn on_session_finished(&self, results: &ExamResults) {
        eprintln!(
            "  Done: {} :: {}/{} ({}%)",
            results.session_id, results.correct_answers, results.total_questions, results.percentage
        );
    }

    fn on_session_failed(&self, session_id: &str, error: &SessionError) {
        eprintln!("  ERROR: {session_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, finished: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {finished}/{total} finished, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    session_ids: Vec<String>,
    now: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let now = parse_now(now.as_deref())?;
    let service = create_service(&config)?;

    if let [session_id] = session_ids.as_slice() {
        let results = service.finish_session(session_id, now).await?;
        print_summary(&results);
        return Ok(());
    }

    let finished = service
        .finish_many(&session_ids, now, &ConsoleObserver)
        .await;
    for results in &finished {
        print_summary(results);
    }

    let failed = session_ids.len() - finished.len();
    anyhow::ensure!(failed == 0, "{failed} session(s) could not be finished");
    Ok(())
}
