//! Rolling score components up into submission and enrollment totals.
//!
//! Every total here is recomputed from source answers and reviews. Nothing
//! is accumulated across calls, so running aggregation twice on the same
//! inputs yields the same numbers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::answer::GradedAnswer;
use crate::config::ScoringConfig;
use crate::model::{CriterionId, Homework, HomeworkSubmission, PeerReview, Project, ProjectSubmission};
use crate::peer_review::{median_rounded_up, neutral_score, score_response};

/// Score components of a homework submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeworkScores {
    pub questions: i32,
    pub faq: i32,
    pub learning_in_public: i32,
}

/// Score components of a project submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectScores {
    pub project: i32,
    pub project_faq: i32,
    pub project_learning_in_public: i32,
    pub peer_review: i32,
    pub peer_review_learning_in_public: i32,
}

/// Sum of homework components, floored at zero.
pub fn aggregate_submission(scores: &HomeworkScores) -> i32 {
    scores
        .questions
        .saturating_add(scores.faq)
        .saturating_add(scores.learning_in_public)
        .max(0)
}

/// Sum of all five project components.
pub fn aggregate_project_submission(scores: &ProjectScores) -> i32 {
    [
        scores.project,
        scores.project_faq,
        scores.project_learning_in_public,
        scores.peer_review,
        scores.peer_review_learning_in_public,
    ]
    .into_iter()
    .fold(0i32, i32::saturating_add)
}

pub fn decide_pass(total_score: i32, pass_threshold: i32) -> bool {
    total_score >= pass_threshold
}

/// Whether a student authored enough submitted reviews to be graded.
///
/// Assigned-but-unsubmitted reviews do not count.
pub fn reviewed_enough(submitted_reviews: u32, number_of_peers_to_evaluate: u32) -> bool {
    submitted_reviews >= number_of_peers_to_evaluate
}

/// Pass decision for a project submission, forced to `false` when the
/// student has not reviewed enough peers.
pub fn decide_project_pass(
    total_score: i32,
    pass_threshold: i32,
    submitted_reviews: u32,
    number_of_peers_to_evaluate: u32,
) -> bool {
    reviewed_enough(submitted_reviews, number_of_peers_to_evaluate)
        && decide_pass(total_score, pass_threshold)
}

/// An enrollment's total: the sum of its submission totals.
pub fn enrollment_total(submission_totals: impl IntoIterator<Item = i32>) -> i32 {
    submission_totals
        .into_iter()
        .fold(0i32, i32::saturating_add)
}

// ---------------------------------------------------------------------------
// Component derivation
// ---------------------------------------------------------------------------

/// Number of non-blank links, capped.
pub fn capped_link_count(links: &[String], cap: u32) -> i32 {
    let count = links.iter().filter(|l| !l.trim().is_empty()).count();
    let capped = count.min(cap as usize);
    i32::try_from(capped).unwrap_or(i32::MAX)
}

fn faq_score(contribution: &str, points: i32) -> i32 {
    if contribution.trim().is_empty() {
        0
    } else {
        points
    }
}

/// Derive homework components from graded answers and the submission.
pub fn homework_scores(
    homework: &Homework,
    submission: &HomeworkSubmission,
    graded: &[GradedAnswer],
    config: &ScoringConfig,
) -> HomeworkScores {
    let questions = graded
        .iter()
        .map(|a| i32::try_from(a.points).unwrap_or(i32::MAX))
        .fold(0i32, i32::saturating_add);
    let cap = homework
        .learning_in_public_cap
        .unwrap_or(config.homework_learning_in_public_cap);

    HomeworkScores {
        questions,
        faq: faq_score(&submission.faq_contribution, config.faq_points),
        learning_in_public: capped_link_count(&submission.learning_in_public_links, cap),
    }
}

/// Per-criterion score a submission received from its submitted reviews.
///
/// Each criterion takes the median of the reviewers' scores, rounded up.
/// With no submitted review at all, every criterion falls back to its
/// neutral score.
pub fn received_criterion_scores(
    project: &Project,
    received: &[&PeerReview],
) -> BTreeMap<CriterionId, i32> {
    let submitted: Vec<&PeerReview> = received
        .iter()
        .copied()
        .filter(|r| r.is_submitted())
        .collect();

    project
        .criteria
        .iter()
        .map(|criterion| {
            if submitted.is_empty() {
                return (criterion.id, neutral_score(criterion));
            }
            let mut scores: Vec<i32> = submitted
                .iter()
                .map(|review| {
                    review
                        .responses
                        .iter()
                        .find(|r| r.criterion_id == criterion.id)
                        .map(|r| score_response(criterion, &r.answer))
                        .unwrap_or(0)
                })
                .collect();
            (criterion.id, median_rounded_up(&mut scores).unwrap_or(0))
        })
        .collect()
}

/// Derive project components.
///
/// `received` are reviews of this submission, `authored` are reviews this
/// submission's student wrote for others. Both may include reviews that
/// were only assigned; those are ignored.
pub fn project_scores(
    project: &Project,
    submission: &ProjectSubmission,
    received: &[&PeerReview],
    authored: &[&PeerReview],
    config: &ScoringConfig,
) -> ProjectScores {
    let project_score = received_criterion_scores(project, received)
        .values()
        .fold(0i32, |acc, &s| acc.saturating_add(s));

    let submitted_authored = authored.iter().filter(|r| r.is_submitted());
    let authored_count = i32::try_from(submitted_authored.clone().count()).unwrap_or(i32::MAX);
    let points_per_review = project
        .points_for_peer_review
        .unwrap_or(config.points_for_peer_review);
    let review_cap = project
        .review_learning_in_public_cap
        .unwrap_or(config.peer_review_learning_in_public_cap);
    let project_cap = project
        .learning_in_public_cap
        .unwrap_or(config.project_learning_in_public_cap);

    ProjectScores {
        project: project_score,
        project_faq: faq_score(&submission.faq_contribution, config.faq_points),
        project_learning_in_public: capped_link_count(
            &submission.learning_in_public_links,
            project_cap,
        ),
        peer_review: authored_count.saturating_mul(points_per_review),
        peer_review_learning_in_public: submitted_authored
            .map(|r| capped_link_count(&r.learning_in_public_links, review_cap))
            .fold(0i32, i32::saturating_add),
    }
}
