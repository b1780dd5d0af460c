//! Cohort recompute orchestrator.
//!
//! Grades every homework and project submission of a course with bounded
//! parallelism, then reduces the complete batch into statistics snapshots,
//! enrollment totals and the leaderboard.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::aggregate::enrollment_total;
use crate::config::ScoringConfig;
use crate::leaderboard::{apply_positions, rank, rank_entries, LeaderboardEntry, RankInput};
use crate::model::{Cohort, Enrollment, EnrollmentId, PeerReview, SubmissionId};
use crate::names::ensure_display_name;
use crate::parser::validate_cohort;
use crate::results::{GradedHomework, GradedProject};
use crate::statistics::{homework_snapshots, project_snapshots, StatisticsSnapshot};
use crate::traits::CohortStore;

/// Everything derived from one course in one recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortResults {
    pub course_id: String,
    /// Graded homework submissions, sorted by submission id.
    pub homeworks: Vec<GradedHomework>,
    /// Graded project submissions, sorted by submission id.
    pub projects: Vec<GradedProject>,
    /// One snapshot per (homework or project, dimension).
    pub statistics: Vec<StatisticsSnapshot>,
    /// Enrollments with refreshed totals, positions and display names.
    pub enrollments: Vec<Enrollment>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub computed_at: DateTime<Utc>,
}

/// The recompute engine.
pub struct RecomputeEngine {
    config: Arc<ScoringConfig>,
}

impl RecomputeEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Load a course from `store`, recompute it and commit the results.
    pub async fn recompute_course(
        &self,
        store: &dyn CohortStore,
        course_id: &str,
    ) -> Result<CohortResults> {
        let start = Instant::now();
        let cohort = store
            .load_cohort(course_id)
            .await
            .with_context(|| format!("failed to load course {course_id} from {}", store.name()))?;

        let results = self.recompute(cohort, Utc::now()).await?;
        store
            .commit(&results)
            .await
            .with_context(|| format!("failed to commit results for course {course_id}"))?;

        tracing::info!(
            course_id,
            homework_submissions = results.homeworks.len(),
            project_submissions = results.projects.len(),
            snapshots = results.statistics.len(),
            ranked = results.leaderboard.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "recomputed course"
        );
        Ok(results)
    }

    /// Recompute every derived value of `cohort`.
    ///
    /// Fails without grading anything when the cohort has a fatal integrity
    /// error. Dangling references only drop the referring record.
    ///
    /// The output only depends on the cohort and `computed_at` (apart from
    /// display names generated for enrollments that lack one).
    pub async fn recompute(
        &self,
        cohort: Cohort,
        computed_at: DateTime<Utc>,
    ) -> Result<CohortResults> {
        validate_cohort(&cohort).ensure_gradable(&cohort.course_id)?;
        let cohort = Arc::new(cohort);

        let mut homeworks = self.grade_homeworks(&cohort).await?;
        homeworks.sort_by_key(|g| g.submission_id);
        let mut projects = self.grade_projects(&cohort).await?;
        projects.sort_by_key(|g| g.submission_id);

        let mut statistics = Vec::new();
        for homework in &cohort.homeworks {
            let graded: Vec<GradedHomework> = homeworks
                .iter()
                .filter(|g| g.homework_id == homework.id)
                .cloned()
                .collect();
            statistics.extend(homework_snapshots(homework.id, &graded, computed_at));
        }
        for project in &cohort.projects {
            let graded: Vec<GradedProject> = projects
                .iter()
                .filter(|g| g.project_id == project.id)
                .cloned()
                .collect();
            statistics.extend(project_snapshots(project.id, &graded, computed_at));
        }

        let mut totals: BTreeMap<EnrollmentId, Vec<i32>> = BTreeMap::new();
        for g in &homeworks {
            totals.entry(g.enrollment_id).or_default().push(g.total_score);
        }
        for g in &projects {
            totals.entry(g.enrollment_id).or_default().push(g.total_score);
        }

        let mut enrollments = cohort.enrollments.clone();
        enrollments.sort_by_key(|e| e.id);
        for enrollment in &mut enrollments {
            let submission_totals = totals.get(&enrollment.id).cloned().unwrap_or_default();
            enrollment.total_score = enrollment_total(submission_totals);
            ensure_display_name(enrollment);
        }

        let inputs: Vec<RankInput> = enrollments.iter().map(RankInput::from).collect();
        apply_positions(&mut enrollments, &rank(&inputs));
        let leaderboard = rank_entries(&inputs);

        Ok(CohortResults {
            course_id: cohort.course_id.clone(),
            homeworks,
            projects,
            statistics,
            enrollments,
            leaderboard,
            computed_at,
        })
    }

    async fn grade_homeworks(&self, cohort: &Arc<Cohort>) -> Result<Vec<GradedHomework>> {
        let homework_index: Arc<HashMap<u64, usize>> = Arc::new(
            cohort
                .homeworks
                .iter()
                .enumerate()
                .map(|(i, h)| (h.id, i))
                .collect(),
        );

        let jobs = (0..cohort.homework_submissions.len()).map(|index| {
            let cohort = Arc::clone(cohort);
            let homework_index = Arc::clone(&homework_index);
            let config = Arc::clone(&self.config);
            move || {
                let submission = &cohort.homework_submissions[index];
                let Some(&h) = homework_index.get(&submission.homework_id) else {
                    tracing::warn!(
                        submission_id = submission.id,
                        homework_id = submission.homework_id,
                        "submission refers to an unknown homework, skipping"
                    );
                    return None;
                };
                Some(GradedHomework::compute(
                    &cohort.homeworks[h],
                    submission,
                    &config,
                ))
            }
        });

        self.run_bounded(jobs).await
    }

    async fn grade_projects(&self, cohort: &Arc<Cohort>) -> Result<Vec<GradedProject>> {
        let project_index: HashMap<u64, usize> = cohort
            .projects
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        let reviews = Arc::new(ReviewIndex::build(&cohort.peer_reviews));
        let project_index = Arc::new(project_index);

        let jobs = (0..cohort.project_submissions.len()).map(|index| {
            let cohort = Arc::clone(cohort);
            let project_index = Arc::clone(&project_index);
            let reviews = Arc::clone(&reviews);
            let config = Arc::clone(&self.config);
            move || {
                let submission = &cohort.project_submissions[index];
                let Some(&p) = project_index.get(&submission.project_id) else {
                    tracing::warn!(
                        submission_id = submission.id,
                        project_id = submission.project_id,
                        "submission refers to an unknown project, skipping"
                    );
                    return None;
                };
                let received = reviews.received(&cohort.peer_reviews, submission.id);
                let authored = reviews.authored(&cohort.peer_reviews, submission.id);
                Some(GradedProject::compute(
                    &cohort.projects[p],
                    submission,
                    &received,
                    &authored,
                    &config,
                ))
            }
        });

        self.run_bounded(jobs).await
    }

    /// Run grading jobs on the blocking pool, at most `parallelism` at once.
    async fn run_bounded<T, F>(&self, jobs: impl IntoIterator<Item = F>) -> Result<Vec<T>>
    where
        F: FnOnce() -> Option<T> + Send + 'static,
        T: Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();

        for job in jobs {
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                tokio::task::spawn_blocking(job)
                    .await
                    .context("grading task failed")
            });
        }

        let mut out = Vec::new();
        while let Some(result) = futures.next().await {
            if let Some(graded) = result? {
                out.push(graded);
            }
        }
        Ok(out)
    }
}

/// Peer review positions grouped by reviewer and reviewee submission.
struct ReviewIndex {
    received: HashMap<SubmissionId, Vec<usize>>,
    authored: HashMap<SubmissionId, Vec<usize>>,
}

impl ReviewIndex {
    fn build(reviews: &[PeerReview]) -> Self {
        let mut received: HashMap<SubmissionId, Vec<usize>> = HashMap::new();
        let mut authored: HashMap<SubmissionId, Vec<usize>> = HashMap::new();
        for (i, review) in reviews.iter().enumerate() {
            received
                .entry(review.reviewee_submission_id)
                .or_default()
                .push(i);
            authored
                .entry(review.reviewer_submission_id)
                .or_default()
                .push(i);
        }
        Self { received, authored }
    }

    fn received<'a>(&self, reviews: &'a [PeerReview], id: SubmissionId) -> Vec<&'a PeerReview> {
        Self::lookup(&self.received, reviews, id)
    }

    fn authored<'a>(&self, reviews: &'a [PeerReview], id: SubmissionId) -> Vec<&'a PeerReview> {
        Self::lookup(&self.authored, reviews, id)
    }

    fn lookup<'a>(
        map: &HashMap<SubmissionId, Vec<usize>>,
        reviews: &'a [PeerReview],
        id: SubmissionId,
    ) -> Vec<&'a PeerReview> {
        map.get(&id)
            .map(|positions| positions.iter().map(|&i| &reviews[i]).collect())
            .unwrap_or_default()
    }
}
