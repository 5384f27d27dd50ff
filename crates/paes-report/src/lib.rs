//! paes-report: Report generation for scored exams.
//!
//! Renders [`ExamResults`](paes_core::results::ExamResults) as a
//! self-contained HTML page or as a Markdown summary.

pub mod html;
pub mod markdown;

pub use html::{generate_html, write_html_report};
pub use markdown::generate_markdown;
