//! The persistence seam.
//!
//! The engine never talks to storage directly. A `CohortStore` hands it a
//! consistent snapshot of one course and receives the complete result set
//! back in a single commit, so readers never observe a half-updated cohort.

use async_trait::async_trait;

use crate::engine::CohortResults;
use crate::model::Cohort;

/// Source of cohort records and sink for computed results.
#[async_trait]
pub trait CohortStore: Send + Sync {
    /// Human-readable store name (e.g. "memory").
    fn name(&self) -> &str;

    /// Load every record of one course.
    async fn load_cohort(&self, course_id: &str) -> anyhow::Result<Cohort>;

    /// Replace all derived data for the course with `results`.
    ///
    /// Implementations must apply the whole set atomically and serialize
    /// concurrent commits for the same course.
    async fn commit(&self, results: &CohortResults) -> anyhow::Result<()>;
}
