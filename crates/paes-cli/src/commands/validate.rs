//! The `paes validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(exam_path: PathBuf) -> Result<()> {
    let exams = if exam_path.is_dir() {
        paes_core::parser::load_exam_directory(&exam_path)?
    } else {
        vec![paes_core::parser::parse_exam(&exam_path)?]
    };

    let mut total_warnings = 0;

    for exam in &exams {
        println!("Exam: {} ({} questions)", exam.title, exam.questions.len());

        let warnings = paes_core::parser::validate_exam(exam);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All exams valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
