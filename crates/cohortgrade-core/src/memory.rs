//! In-process cohort store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::engine::CohortResults;
use crate::model::Cohort;
use crate::traits::CohortStore;

/// A `CohortStore` that keeps cohorts and their latest results in memory.
///
/// Used by the CLI after loading cohort files, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    cohorts: RwLock<HashMap<String, Cohort>>,
    results: RwLock<HashMap<String, CohortResults>>,
    commit_count: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `cohorts`, keyed by course id.
    pub fn with_cohorts(cohorts: impl IntoIterator<Item = Cohort>) -> Self {
        let cohorts = cohorts
            .into_iter()
            .map(|c| (c.course_id.clone(), c))
            .collect();
        Self {
            cohorts: RwLock::new(cohorts),
            ..Self::default()
        }
    }

    /// Insert or replace a cohort.
    pub async fn insert(&self, cohort: Cohort) {
        self.cohorts
            .write()
            .await
            .insert(cohort.course_id.clone(), cohort);
    }

    /// Ids of every stored course, sorted.
    pub async fn course_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cohorts.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The latest committed results for a course.
    pub async fn results(&self, course_id: &str) -> Option<CohortResults> {
        self.results.read().await.get(course_id).cloned()
    }

    /// Number of commits applied so far.
    pub fn commit_count(&self) -> u32 {
        self.commit_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CohortStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_cohort(&self, course_id: &str) -> anyhow::Result<Cohort> {
        self.cohorts
            .read()
            .await
            .get(course_id)
            .cloned()
            .with_context(|| format!("course not found: {course_id}"))
    }

    async fn commit(&self, results: &CohortResults) -> anyhow::Result<()> {
        // Holding the write lock for both maps keeps the cohort's enrollment
        // view and its results in step.
        let mut cohorts = self.cohorts.write().await;
        let mut stored = self.results.write().await;

        let cohort = cohorts
            .get_mut(&results.course_id)
            .with_context(|| format!("course not found: {}", results.course_id))?;
        cohort.enrollments = results.enrollments.clone();
        stored.insert(results.course_id.clone(), results.clone());

        self.commit_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_course_is_an_error() {
        let store = MemoryStore::new();
        let err = store.load_cohort("nope").await.unwrap_err();
        assert!(err.to_string().contains("course not found"));
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn cohorts_are_keyed_by_course_id() {
        let store = MemoryStore::with_cohorts([
            Cohort {
                course_id: "b".into(),
                ..Cohort::default()
            },
            Cohort {
                course_id: "a".into(),
                ..Cohort::default()
            },
        ]);
        assert_eq!(store.course_ids().await, vec!["a", "b"]);
        assert_eq!(store.load_cohort("a").await.unwrap().course_id, "a");
        assert!(store.results("a").await.is_none());
        assert_eq!(store.commit_count(), 0);
    }
}
