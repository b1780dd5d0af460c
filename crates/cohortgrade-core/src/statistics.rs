//! Descriptive statistics over cohort score and time distributions.
//!
//! Quantiles use linear interpolation between closest ranks: for a sorted
//! sample of length `n`, the `p`-quantile sits at fractional rank
//! `h = p * (n - 1)` and is interpolated between `x[floor(h)]` and
//! `x[ceil(h)]`. The same method serves the median and both quartiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{HomeworkId, ProjectId};
use crate::results::{GradedHomework, GradedProject};

/// Summary of one numeric sample.
///
/// With zero samples every statistic is `None`, so an empty distribution
/// stays distinguishable from one made of zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub q1: Option<f64>,
    pub q3: Option<f64>,
    pub count: usize,
}

/// Compute min/max/mean/median/quartiles. NaN and infinite samples are ignored.
pub fn compute_stats(samples: &[f64]) -> Stats {
    let mut sorted: Vec<f64> = samples.iter().copied().filter(|s| s.is_finite()).collect();
    if sorted.is_empty() {
        return Stats::default();
    }
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;

    Stats {
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        mean: Some(mean),
        median: quantile_sorted(&sorted, 0.5),
        q1: quantile_sorted(&sorted, 0.25),
        q3: quantile_sorted(&sorted, 0.75),
        count,
    }
}

/// Linearly interpolated quantile of an already sorted sample.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let h = p.clamp(0.0, 1.0) * last as f64;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = h - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

// ---------------------------------------------------------------------------
// Dimensions and snapshots
// ---------------------------------------------------------------------------

/// A named numeric measure extracted from each record of a cohort.
///
/// Returning `None` excludes that record from this dimension only.
pub struct Dimension<T> {
    pub name: &'static str,
    pub extract: fn(&T) -> Option<f64>,
}

impl<T> Dimension<T> {
    pub const fn new(name: &'static str, extract: fn(&T) -> Option<f64>) -> Self {
        Self { name, extract }
    }

    /// Collect this dimension's samples from `records`.
    pub fn samples<'a>(&self, records: impl IntoIterator<Item = &'a T>) -> Vec<f64>
    where
        T: 'a,
    {
        records.into_iter().filter_map(self.extract).collect()
    }
}

pub const HOMEWORK_DIMENSIONS: &[Dimension<GradedHomework>] = &[
    Dimension::new("questions_score", |h: &GradedHomework| Some(f64::from(h.scores.questions))),
    Dimension::new("faq_score", |h: &GradedHomework| Some(f64::from(h.scores.faq))),
    Dimension::new("learning_in_public_score", |h: &GradedHomework| {
        Some(f64::from(h.scores.learning_in_public))
    }),
    Dimension::new("total_score", |h: &GradedHomework| Some(f64::from(h.total_score))),
    Dimension::new("time_spent_lectures", |h: &GradedHomework| h.time_spent_lectures),
    Dimension::new("time_spent_homework", |h: &GradedHomework| h.time_spent_homework),
];

pub const PROJECT_DIMENSIONS: &[Dimension<GradedProject>] = &[
    Dimension::new("project_score", |p: &GradedProject| Some(f64::from(p.scores.project))),
    Dimension::new("project_faq_score", |p: &GradedProject| Some(f64::from(p.scores.project_faq))),
    Dimension::new("project_learning_in_public_score", |p: &GradedProject| {
        Some(f64::from(p.scores.project_learning_in_public))
    }),
    Dimension::new("peer_review_score", |p: &GradedProject| Some(f64::from(p.scores.peer_review))),
    Dimension::new("peer_review_learning_in_public_score", |p: &GradedProject| {
        Some(f64::from(p.scores.peer_review_learning_in_public))
    }),
    Dimension::new("total_score", |p: &GradedProject| Some(f64::from(p.total_score))),
    Dimension::new("time_spent", |p: &GradedProject| p.time_spent),
];

/// What a snapshot summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Subject {
    Homework(HomeworkId),
    Project(ProjectId),
}

/// Statistics of one dimension for one homework or project.
///
/// Snapshots are replaced wholesale on every recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub subject: Subject,
    pub dimension: String,
    #[serde(flatten)]
    pub stats: Stats,
    pub computed_at: DateTime<Utc>,
}

/// One snapshot per dimension over the same set of records.
pub fn compute_snapshots<T>(
    subject: Subject,
    dimensions: &[Dimension<T>],
    records: &[T],
    computed_at: DateTime<Utc>,
) -> Vec<StatisticsSnapshot> {
    dimensions
        .iter()
        .map(|dimension| StatisticsSnapshot {
            subject,
            dimension: dimension.name.to_string(),
            stats: compute_stats(&dimension.samples(records)),
            computed_at,
        })
        .collect()
}

pub fn homework_snapshots(
    homework_id: HomeworkId,
    graded: &[GradedHomework],
    computed_at: DateTime<Utc>,
) -> Vec<StatisticsSnapshot> {
    compute_snapshots(
        Subject::Homework(homework_id),
        HOMEWORK_DIMENSIONS,
        graded,
        computed_at,
    )
}

pub fn project_snapshots(
    project_id: ProjectId,
    graded: &[GradedProject],
    computed_at: DateTime<Utc>,
) -> Vec<StatisticsSnapshot> {
    compute_snapshots(
        Subject::Project(project_id),
        PROJECT_DIMENSIONS,
        graded,
        computed_at,
    )
}
