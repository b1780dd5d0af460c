//! Cohort report types with JSON persistence and leaderboard movement.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::CohortResults;
use crate::model::{Cohort, EnrollmentId};

/// A complete grading report for one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the course (without the raw records).
    pub course: CourseSummary,
    /// Everything the recompute produced.
    pub results: CohortResults,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub homework_count: usize,
    pub project_count: usize,
    pub enrollment_count: usize,
}

impl From<&Cohort> for CourseSummary {
    fn from(cohort: &Cohort) -> Self {
        Self {
            id: cohort.course_id.clone(),
            title: cohort.title.clone(),
            homework_count: cohort.homeworks.len(),
            project_count: cohort.projects.len(),
            enrollment_count: cohort.enrollments.len(),
        }
    }
}

impl CohortReport {
    pub fn new(course: CourseSummary, results: CohortResults, duration_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            course,
            results,
            duration_ms,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: CohortReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report's leaderboard against a baseline.
    pub fn compare(&self, baseline: &CohortReport) -> MovementReport {
        let positions = |report: &CohortReport| -> BTreeMap<EnrollmentId, (u32, i32)> {
            report
                .results
                .leaderboard
                .iter()
                .map(|e| (e.enrollment_id, (e.position, e.total_score)))
                .collect()
        };

        let before = positions(baseline);
        let after = positions(self);

        let mut report = MovementReport::default();
        for (&enrollment_id, &(current_position, current_score)) in &after {
            let Some(&(baseline_position, baseline_score)) = before.get(&enrollment_id) else {
                report.entered.push(enrollment_id);
                continue;
            };
            let movement = Movement {
                enrollment_id,
                baseline_position,
                current_position,
                // Positive when the student climbed.
                delta: i64::from(baseline_position) - i64::from(current_position),
                score_delta: i64::from(current_score) - i64::from(baseline_score),
            };
            match movement.delta {
                d if d > 0 => report.risers.push(movement),
                d if d < 0 => report.fallers.push(movement),
                _ => report.unchanged += 1,
            }
        }
        report.left = before
            .keys()
            .filter(|id| !after.contains_key(id))
            .copied()
            .collect();

        report.risers.sort_by_key(|m| (-m.delta, m.enrollment_id));
        report.fallers.sort_by_key(|m| (m.delta, m.enrollment_id));
        report
    }
}

/// Leaderboard movement between two reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementReport {
    /// Enrollments that moved up, biggest climb first.
    pub risers: Vec<Movement>,
    /// Enrollments that moved down, biggest drop first.
    pub fallers: Vec<Movement>,
    pub unchanged: usize,
    /// Ranked now but not in the baseline.
    pub entered: Vec<EnrollmentId>,
    /// Ranked in the baseline but not now.
    pub left: Vec<EnrollmentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub enrollment_id: EnrollmentId,
    pub baseline_position: u32,
    pub current_position: u32,
    pub delta: i64,
    pub score_delta: i64,
}

impl MovementReport {
    /// Format the movement report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} risers, {} fallers, {} unchanged, {} entered, {} left\n\n",
            self.risers.len(),
            self.fallers.len(),
            self.unchanged,
            self.entered.len(),
            self.left.len()
        ));

        for (title, rows) in [("Risers", &self.risers), ("Fallers", &self.fallers)] {
            if rows.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Enrollment | Baseline | Current | Delta | Score delta |\n");
            md.push_str("|------------|----------|---------|-------|-------------|\n");
            for m in rows {
                md.push_str(&format!(
                    "| {} | {} | {} | {:+} | {:+} |\n",
                    m.enrollment_id,
                    m.baseline_position,
                    m.current_position,
                    m.delta,
                    m.score_delta
                ));
            }
            md.push('\n');
        }

        if !self.entered.is_empty() {
            md.push_str(&format!("**Entered:** {}\n", join_ids(&self.entered)));
        }
        if !self.left.is_empty() {
            md.push_str(&format!("**Left:** {}\n", join_ids(&self.left)));
        }

        md
    }

    /// Returns true if any ranked enrollment changed position or membership.
    pub fn has_changes(&self) -> bool {
        !(self.risers.is_empty()
            && self.fallers.is_empty()
            && self.entered.is_empty()
            && self.left.is_empty())
    }
}

fn join_ids(ids: &[EnrollmentId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
