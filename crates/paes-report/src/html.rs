//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use paes_core::model::{DifficultyLevel, Skill, Subject};
use paes_core::results::{ExamResults, Period, Priority};

/// Escape a string for safe HTML insertion.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Format seconds as `1h 02m 03s`, `2m 05s` or `7s`.
pub(crate) fn format_duration(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

fn percentage_class(percentage: u32) -> &'static str {
    if percentage >= 60 {
        "pass"
    } else if percentage >= 40 {
        "warn"
    } else {
        "fail"
    }
}

/// Generate an HTML report from scored exam results.
pub fn generate_html(results: &ExamResults) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Resultados PAES: {}</title>\n",
        html_escape(&results.exam_id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Resultados del ensayo</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Ensayo: <strong>{}</strong> | Usuario: {} | Sesión: {} | {}</p>\n",
        html_escape(&results.exam_id),
        html_escape(&results.user_id),
        html_escape(&results.session_id),
        results.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str(&format!(
        "<p class=\"score {}\">{} / {} correctas ({}%) en {}</p>\n",
        percentage_class(results.percentage),
        results.correct_answers,
        results.total_questions,
        results.percentage,
        format_duration(results.time_spent)
    ));
    html.push_str("</header>\n");

    // Subjects
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Por asignatura</h2>\n");
    html.push_str("<table>\n");
    html.push_str(
        "<thead><tr><th>Asignatura</th><th>Correctas</th><th>%</th><th>Tiempo</th></tr></thead>\n",
    );
    html.push_str("<tbody>\n");
    for (subject, score) in &results.subject_scores {
        if score.total == 0 {
            continue;
        }
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}/{}</td><td class=\"{}\">{}%</td><td>{}</td></tr>\n",
            html_escape(subject.display_name()),
            score.score,
            score.total,
            percentage_class(score.percentage),
            score.percentage,
            format_duration(score.time_spent),
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str(&generate_bar_chart(
        results
            .subject_scores
            .iter()
            .filter(|(_, s)| s.total > 0)
            .map(|(subject, s)| (subject.display_name(), s.percentage)),
    ));
    html.push_str("</section>\n");

    // Skills and difficulty
    html.push_str("<section>\n");
    html.push_str("<h2>Por habilidad</h2>\n");
    push_bucket_table(
        &mut html,
        "Habilidad",
        results.skill_scores.iter().map(|(skill, s)| {
            (
                Skill::display_name(skill),
                s.score,
                s.total,
                s.percentage,
                s.average_time,
            )
        }),
    );
    html.push_str("<h2>Por dificultad</h2>\n");
    push_bucket_table(
        &mut html,
        "Dificultad",
        results.difficulty_analysis.iter().map(|(level, s)| {
            (
                DifficultyLevel::display_name(level),
                s.score,
                s.total,
                s.percentage,
                s.average_time,
            )
        }),
    );
    html.push_str("</section>\n");

    // Time analysis
    let time = &results.time_analysis;
    html.push_str("<section>\n");
    html.push_str("<h2>Análisis de tiempo</h2>\n");
    html.push_str(&format!(
        "<p>Tiempo promedio por pregunta: <strong>{:.1}s</strong></p>\n",
        time.average_time_per_question
    ));
    html.push_str(&format!(
        "<p>Periodos apresurados: {}</p>\n",
        format_periods(&time.rush_periods)
    ));
    html.push_str(&format!(
        "<p>Periodos lentos: {}</p>\n",
        format_periods(&time.slow_periods)
    ));
    html.push_str("</section>\n");

    // Incorrect questions
    html.push_str("<section>\n");
    html.push_str(&format!(
        "<h2>Preguntas a revisar ({})</h2>\n",
        results.incorrect_questions.len()
    ));
    if !results.incorrect_questions.is_empty() {
        html.push_str("<table>\n");
        html.push_str("<thead><tr><th>Pregunta</th><th>Asignatura</th><th>Tu respuesta</th><th>Correcta</th><th>Explicación</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for q in &results.incorrect_questions {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td class=\"fail\">{}</td><td class=\"pass\">{}</td><td>{}</td></tr>\n",
                html_escape(&q.question_id),
                html_escape(Subject::display_name(&q.subject)),
                html_escape(&q.user_answer.to_string()),
                html_escape(&q.correct_answer.to_string()),
                html_escape(q.explanation.as_deref().unwrap_or("")),
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Recommendations
    html.push_str("<section>\n");
    html.push_str("<h2>Recomendaciones</h2>\n");
    if results.recommendations.is_empty() {
        html.push_str("<p>¡Buen trabajo! No hay recomendaciones pendientes.</p>\n");
    } else {
        html.push_str("<ol class=\"recommendations\">\n");
        for rec in &results.recommendations {
            let class = match rec.priority {
                Priority::High => "high",
                Priority::Medium => "medium",
            };
            html.push_str(&format!(
                "<li class=\"{}\"><strong>[{}]</strong> {}\n<ul>\n",
                class,
                rec.priority,
                html_escape(&rec.description)
            ));
            for item in &rec.action_items {
                html.push_str(&format!("<li>{}</li>\n", html_escape(item)));
            }
            html.push_str("</ul></li>\n");
        }
        html.push_str("</ol>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Datos JSON</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(results).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(results: &ExamResults, path: &Path) -> Result<()> {
    let html = generate_html(results);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn push_bucket_table<'a>(
    html: &mut String,
    label: &str,
    rows: impl Iterator<Item = (&'a str, u32, u32, u32, u32)>,
) {
    html.push_str("<table>\n");
    html.push_str(&format!(
        "<thead><tr><th>{label}</th><th>Correctas</th><th>%</th><th>Tiempo promedio</th></tr></thead>\n"
    ));
    html.push_str("<tbody>\n");
    for (name, score, total, percentage, average_time) in rows {
        if total == 0 {
            continue;
        }
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}/{}</td><td class=\"{}\">{}%</td><td>{}s</td></tr>\n",
            html_escape(name),
            score,
            total,
            percentage_class(percentage),
            percentage,
            average_time,
        ));
    }
    html.push_str("</tbody></table>\n");
}

/// Periods as 1-based question ranges.
pub(crate) fn format_periods(periods: &[Period]) -> String {
    if periods.is_empty() {
        return "ninguno".to_string();
    }
    periods
        .iter()
        .map(|p| {
            if p.start == p.end {
                format!("pregunta {}", p.start + 1)
            } else {
                format!("preguntas {}-{}", p.start + 1, p.end + 1)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn generate_bar_chart<'a>(bars: impl Iterator<Item = (&'a str, u32)>) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 220;

    let bars: Vec<(&str, u32)> = bars.collect();
    if bars.is_empty() {
        return String::new();
    }

    let total_height = bars.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (name, percentage)) in bars.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (*percentage).min(100) as usize * max_width / 100;

        let color = if *percentage >= 60 {
            "#22c55e"
        } else if *percentage >= 40 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            percentage
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --warn: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --warn: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.score { font-size: 1.5rem; padding: 0.5rem 1rem; border-radius: 8px; display: inline-block; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.pass { background: var(--pass); }
.warn { background: var(--warn); }
.fail { background: var(--fail); }
.recommendations li.high { border-left: 4px solid #ef4444; padding-left: 0.5rem; }
.recommendations li.medium { border-left: 4px solid #eab308; padding-left: 0.5rem; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;
