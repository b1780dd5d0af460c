//! End-to-end recompute tests over the example cohort.
//!
//! These tests drive the parser, the recompute engine and the in-memory
//! store together, the same way the `grade` command does.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use cohortgrade_core::config::ScoringConfig;
use cohortgrade_core::engine::RecomputeEngine;
use cohortgrade_core::memory::MemoryStore;
use cohortgrade_core::model::{Cohort, ReviewState};
use cohortgrade_core::parser::{parse_cohort, validate_cohort};
use cohortgrade_core::statistics::Subject;
use cohortgrade_core::traits::CohortStore;

fn example() -> Cohort {
    parse_cohort(Path::new("../../cohorts/example.toml")).unwrap()
}

fn engine() -> RecomputeEngine {
    RecomputeEngine::new(ScoringConfig::default())
}

#[test]
fn example_cohort_is_valid() {
    let validation = validate_cohort(&example());
    assert!(validation.errors.is_empty(), "{:?}", validation.errors);
    assert!(validation.warnings.is_empty(), "{:?}", validation.warnings);
}

#[tokio::test]
async fn homework_components() {
    let results = engine().recompute(example(), Utc::now()).await.unwrap();

    let totals: Vec<(u64, i32, i32, i32, i32)> = results
        .homeworks
        .iter()
        .map(|h| {
            (
                h.submission_id,
                h.scores.questions,
                h.scores.faq,
                h.scores.learning_in_public,
                h.total_score,
            )
        })
        .collect();
    assert_eq!(
        totals,
        vec![
            (1, 6, 1, 2, 9),
            // Only the float answer is within tolerance.
            (2, 1, 0, 0, 1),
            // Nine links, capped at seven.
            (3, 4, 0, 7, 11),
            (4, 4, 1, 1, 6),
            (5, 1, 0, 0, 1),
            (6, 0, 0, 0, 0),
        ]
    );
}

#[tokio::test]
async fn project_components() {
    let results = engine().recompute(example(), Utc::now()).await.unwrap();

    let p10 = &results.projects[0];
    // Criterion 1: median(2, 1) rounds up to 2; criterion 2: median(3, 4) to 4.
    assert_eq!(p10.scores.project, 6);
    assert_eq!(p10.scores.peer_review, 6);
    assert_eq!(p10.total_score, 12);
    assert!(p10.passed);

    let p11 = &results.projects[1];
    assert_eq!(p11.scores.project, 2);
    assert_eq!(p11.reviews_submitted, 1);
    assert!(!p11.reviewed_enough);
    assert!(!p11.passed);

    // The assigned review of submission 12 is ignored.
    let p12 = &results.projects[2];
    assert_eq!(p12.scores.project, 2);
    assert_eq!(p12.total_score, 8);
    assert!(p12.passed);
}

#[tokio::test]
async fn statistics_cover_every_dimension() {
    let results = engine().recompute(example(), Utc::now()).await.unwrap();
    assert_eq!(results.statistics.len(), 2 * 6 + 7);

    let week1_total = results
        .statistics
        .iter()
        .find(|s| s.subject == Subject::Homework(1) && s.dimension == "total_score")
        .unwrap();
    // Totals 9, 1, 11, 6.
    assert_eq!(week1_total.stats.count, 4);
    assert_eq!(week1_total.stats.min, Some(1.0));
    assert_eq!(week1_total.stats.max, Some(11.0));
    assert_eq!(week1_total.stats.median, Some(7.5));
    assert_eq!(week1_total.stats.mean, Some(6.75));

    // Only two submissions reported lecture time.
    let lectures = results
        .statistics
        .iter()
        .find(|s| s.subject == Subject::Homework(1) && s.dimension == "time_spent_lectures")
        .unwrap();
    assert_eq!(lectures.stats.count, 2);
    assert_eq!(lectures.stats.median, Some(5.0));
}

#[tokio::test]
async fn commit_updates_store() {
    let store = MemoryStore::with_cohorts([example()]);
    let results = engine()
        .recompute_course(&store, "intro-data-2026")
        .await
        .unwrap();

    assert_eq!(store.commit_count(), 1);
    let reloaded = store.load_cohort("intro-data-2026").await.unwrap();
    assert_eq!(reloaded.enrollments, results.enrollments);
    let unnamed = reloaded.enrollments.iter().find(|e| e.id == 4).unwrap();
    assert!(unnamed.display_name.is_some());
}

#[tokio::test]
async fn recompute_after_new_review_moves_scores() {
    let store = MemoryStore::with_cohorts([example()]);
    let engine = engine();
    let before = engine
        .recompute_course(&store, "intro-data-2026")
        .await
        .unwrap();

    // Grace finally submits her second review.
    let mut cohort = store.load_cohort("intro-data-2026").await.unwrap();
    let review = cohort.peer_reviews.iter_mut().find(|r| r.id == 4).unwrap();
    review.state = ReviewState::Submitted;
    store.insert(cohort).await;

    let after = engine
        .recompute_course(&store, "intro-data-2026")
        .await
        .unwrap();
    assert!(!before.projects[1].passed);
    assert!(after.projects[1].reviewed_enough);
    assert_eq!(after.projects[1].scores.peer_review, 6);

    let grace = after.enrollments.iter().find(|e| e.id == 2).unwrap();
    assert_eq!(grace.total_score, 9);
    assert_eq!(grace.position_on_leaderboard, Some(2));
    assert_eq!(store.commit_count(), 2);
}

#[tokio::test]
async fn concurrent_recomputes_agree() {
    let store = Arc::new(MemoryStore::with_cohorts([example()]));
    let engine = Arc::new(RecomputeEngine::new(ScoringConfig {
        parallelism: 3,
        ..ScoringConfig::default()
    }));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let store = Arc::clone(&store);
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .recompute_course(store.as_ref(), "intro-data-2026")
                .await
                .unwrap()
                .leaderboard
        }));
    }

    let mut boards = Vec::new();
    for handle in handles {
        boards.push(handle.await.unwrap());
    }
    assert!(boards.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(store.commit_count(), 4);
}
