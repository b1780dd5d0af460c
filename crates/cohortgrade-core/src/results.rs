//! Graded submission types handed back to the persistence layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{
    aggregate_project_submission, aggregate_submission, decide_project_pass, homework_scores,
    project_scores, reviewed_enough, HomeworkScores, ProjectScores,
};
use crate::answer::{grade, GradedAnswer};
use crate::config::ScoringConfig;
use crate::model::{
    EnrollmentId, Homework, HomeworkId, HomeworkSubmission, PeerReview, Project, ProjectId,
    ProjectSubmission, QuestionSpec, SubmissionId,
};

/// A homework submission after grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedHomework {
    pub submission_id: SubmissionId,
    pub homework_id: HomeworkId,
    pub enrollment_id: EnrollmentId,
    pub answers: Vec<GradedAnswer>,
    pub scores: HomeworkScores,
    pub total_score: i32,
    /// Carried through for the time dimensions of the statistics.
    #[serde(default)]
    pub time_spent_lectures: Option<f64>,
    #[serde(default)]
    pub time_spent_homework: Option<f64>,
}

impl GradedHomework {
    /// Grade every answer of `submission` and roll up its components.
    ///
    /// Answers to questions that are not part of the homework are dropped;
    /// unanswered questions simply earn nothing.
    pub fn compute(
        homework: &Homework,
        submission: &HomeworkSubmission,
        config: &ScoringConfig,
    ) -> Self {
        let questions: HashMap<_, &QuestionSpec> =
            homework.questions.iter().map(|q| (q.id, q)).collect();

        let mut answers: Vec<GradedAnswer> = submission
            .answers
            .iter()
            .filter_map(|answer| {
                let question = questions.get(&answer.question_id);
                if question.is_none() {
                    tracing::debug!(
                        submission_id = submission.id,
                        question_id = answer.question_id,
                        "answer refers to a question outside the homework"
                    );
                }
                question.map(|q| grade(q, answer))
            })
            .collect();
        answers.sort_by_key(|a| a.question_id);
        answers.dedup_by_key(|a| a.question_id);

        let scores = homework_scores(homework, submission, &answers, config);
        Self {
            submission_id: submission.id,
            homework_id: homework.id,
            enrollment_id: submission.enrollment_id,
            answers,
            scores,
            total_score: aggregate_submission(&scores),
            time_spent_lectures: submission.time_spent_lectures,
            time_spent_homework: submission.time_spent_homework,
        }
    }
}

/// A project submission after peer review aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedProject {
    pub submission_id: SubmissionId,
    pub project_id: ProjectId,
    pub enrollment_id: EnrollmentId,
    pub scores: ProjectScores,
    pub total_score: i32,
    /// Submitted reviews this student authored.
    pub reviews_submitted: u32,
    pub reviewed_enough: bool,
    pub passed: bool,
    #[serde(default)]
    pub time_spent: Option<f64>,
}

impl GradedProject {
    pub fn compute(
        project: &Project,
        submission: &ProjectSubmission,
        received: &[&PeerReview],
        authored: &[&PeerReview],
        config: &ScoringConfig,
    ) -> Self {
        let scores = project_scores(project, submission, received, authored, config);
        let total_score = aggregate_project_submission(&scores);
        let reviews_submitted =
            u32::try_from(authored.iter().filter(|r| r.is_submitted()).count())
                .unwrap_or(u32::MAX);
        let enough = reviewed_enough(reviews_submitted, project.number_of_peers_to_evaluate);
        if !enough {
            tracing::warn!(
                submission_id = submission.id,
                project_id = project.id,
                reviews_submitted,
                required = project.number_of_peers_to_evaluate,
                "not enough peer reviews submitted; marking as failed"
            );
        }

        Self {
            submission_id: submission.id,
            project_id: project.id,
            enrollment_id: submission.enrollment_id,
            scores,
            total_score,
            reviews_submitted,
            reviewed_enough: enough,
            passed: decide_project_pass(
                total_score,
                project.points_to_pass,
                reviews_submitted,
                project.number_of_peers_to_evaluate,
            ),
            time_spent: submission.time_spent,
        }
    }
}
