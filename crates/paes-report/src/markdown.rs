//! Markdown summary of exam results, for terminals, PR comments and notes.

use paes_core::results::ExamResults;

use crate::html::{format_duration, format_periods};

/// Escape the characters that would break a markdown table cell.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Generate a markdown report from scored exam results.
pub fn generate_markdown(results: &ExamResults) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Resultados: {}\n\n", cell(&results.exam_id)));
    md.push_str(&format!(
        "**Puntaje:** {}/{} ({}%) | **Tiempo:** {} | **Completado:** {}\n\n",
        results.correct_answers,
        results.total_questions,
        results.percentage,
        format_duration(results.time_spent),
        results.completed_at.format("%Y-%m-%d %H:%M UTC")
    ));

    md.push_str("## Por asignatura\n\n");
    md.push_str("| Asignatura | Correctas | % | Tiempo |\n");
    md.push_str("|------------|-----------|---|--------|\n");
    for (subject, s) in results.subject_scores.iter().filter(|(_, s)| s.total > 0) {
        md.push_str(&format!(
            "| {} | {}/{} | {}% | {} |\n",
            subject.display_name(),
            s.score,
            s.total,
            s.percentage,
            format_duration(s.time_spent)
        ));
    }
    md.push('\n');

    md.push_str("## Por habilidad\n\n");
    md.push_str("| Habilidad | Correctas | % | Tiempo promedio |\n");
    md.push_str("|-----------|-----------|---|-----------------|\n");
    for (skill, s) in results.skill_scores.iter().filter(|(_, s)| s.total > 0) {
        md.push_str(&format!(
            "| {} | {}/{} | {}% | {}s |\n",
            skill.display_name(),
            s.score,
            s.total,
            s.percentage,
            s.average_time
        ));
    }
    md.push('\n');

    let time = &results.time_analysis;
    md.push_str("## Tiempo\n\n");
    md.push_str(&format!(
        "- Promedio por pregunta: {:.1}s\n- Apresurado: {}\n- Lento: {}\n\n",
        time.average_time_per_question,
        format_periods(&time.rush_periods),
        format_periods(&time.slow_periods)
    ));

    if !results.incorrect_questions.is_empty() {
        md.push_str("## Preguntas a revisar\n\n");
        md.push_str("| Pregunta | Tu respuesta | Correcta | Explicación |\n");
        md.push_str("|----------|--------------|----------|-------------|\n");
        for q in &results.incorrect_questions {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                cell(&q.question_id),
                q.user_answer,
                q.correct_answer,
                cell(q.explanation.as_deref().unwrap_or(""))
            ));
        }
        md.push('\n');
    }

    if !results.recommendations.is_empty() {
        md.push_str("## Recomendaciones\n\n");
        for rec in &results.recommendations {
            md.push_str(&format!("- **[{}]** {}\n", rec.priority, rec.description));
            for item in &rec.action_items {
                md.push_str(&format!("  - {item}\n"));
            }
        }
    }

    md
}
