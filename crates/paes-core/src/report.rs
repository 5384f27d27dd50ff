//! Results persistence on disk and progress comparison between attempts.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::results::ExamResults;

impl ExamResults {
    /// Save the results as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize results")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write results to {}", path.display()))?;
        Ok(())
    }

    /// Load results from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read results from {}", path.display()))?;
        let results: ExamResults =
            serde_json::from_str(&content).context("failed to parse results JSON")?;
        Ok(results)
    }

    /// Compare these results against an earlier attempt.
    ///
    /// Only subjects and skills answered in both attempts are compared.
    /// A change of more than `threshold` percentage points counts as an
    /// improvement or decline.
    pub fn compare(&self, baseline: &ExamResults, threshold: f64) -> ProgressReport {
        let mut changes = Vec::new();
        let mut unchanged = 0usize;

        let subjects = self.subject_scores.iter().filter_map(|(subject, current)| {
            let before = baseline.subject_scores.get(subject)?;
            (before.total > 0 && current.total > 0).then(|| {
                (
                    AreaKind::Subject,
                    subject.display_name(),
                    before.percentage,
                    current.percentage,
                )
            })
        });
        let skills = self.skill_scores.iter().filter_map(|(skill, current)| {
            let before = baseline.skill_scores.get(skill)?;
            (before.total > 0 && current.total > 0).then(|| {
                (
                    AreaKind::Skill,
                    skill.display_name(),
                    before.percentage,
                    current.percentage,
                )
            })
        });

        for (kind, name, before, after) in subjects.chain(skills) {
            let delta = f64::from(after) - f64::from(before);
            if delta.abs() > threshold {
                changes.push(AreaChange {
                    kind,
                    area: name.to_string(),
                    baseline_percentage: before,
                    current_percentage: after,
                    delta,
                });
            } else {
                unchanged += 1;
            }
        }

        let (declines, improvements) = changes.into_iter().partition(|c| c.delta < 0.0);

        ProgressReport {
            baseline_percentage: baseline.percentage,
            current_percentage: self.percentage,
            overall_delta: f64::from(self.percentage) - f64::from(baseline.percentage),
            declines,
            improvements,
            unchanged,
        }
    }
}

/// Whether a compared area is a subject or a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaKind {
    Subject,
    Skill,
}

/// A subject or skill whose percentage moved past the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaChange {
    pub kind: AreaKind,
    /// Display name of the subject or skill.
    pub area: String,
    pub baseline_percentage: u32,
    pub current_percentage: u32,
    /// Percentage points gained (positive) or lost (negative).
    pub delta: f64,
}

/// Result of comparing two attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub baseline_percentage: u32,
    pub current_percentage: u32,
    pub overall_delta: f64,
    /// Areas where the score went down.
    pub declines: Vec<AreaChange>,
    /// Areas where the score went up.
    pub improvements: Vec<AreaChange>,
    /// Areas with no significant change.
    pub unchanged: usize,
}

impl ProgressReport {
    /// Format the progress report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Overall:** {}% -> {}% ({:+.0} pts)\n\n",
            self.baseline_percentage, self.current_percentage, self.overall_delta
        ));
        md.push_str(&format!(
            "**Summary:** {} declines, {} improvements, {} unchanged\n\n",
            self.declines.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, rows) in [
            ("Declines", &self.declines),
            ("Improvements", &self.improvements),
        ] {
            if rows.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Area | Kind | Before | After | Delta |\n");
            md.push_str("|------|------|--------|-------|-------|\n");
            for c in rows {
                md.push_str(&format!(
                    "| {} | {:?} | {}% | {}% | {:+.0} |\n",
                    c.area, c.kind, c.baseline_percentage, c.current_percentage, c.delta
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if any area declined.
    pub fn has_declines(&self) -> bool {
        !self.declines.is_empty()
    }
}
