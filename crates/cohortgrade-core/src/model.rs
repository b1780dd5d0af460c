//! Core data model types for cohortgrade.
//!
//! These are immutable snapshots of the records the persistence layer hands
//! to the engine: questions, review criteria, submissions, peer reviews and
//! enrollments, grouped per course into a [`Cohort`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IntegrityError;

pub type QuestionId = u64;
pub type HomeworkId = u64;
pub type ProjectId = u64;
pub type CriterionId = u64;
pub type EnrollmentId = u64;
pub type SubmissionId = u64;
pub type ReviewId = u64;

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

/// How a question is presented and which comparison applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    FreeForm,
    Checkboxes,
}

impl QuestionType {
    /// Choice questions encode answers as option indices.
    pub fn is_choice(self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::Checkboxes)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "multiple_choice"),
            QuestionType::FreeForm => write!(f, "free_form"),
            QuestionType::Checkboxes => write!(f, "checkboxes"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = IntegrityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "multiple_choice" | "mc" => Ok(QuestionType::MultipleChoice),
            "free_form" | "ff" => Ok(QuestionType::FreeForm),
            "checkboxes" | "cb" => Ok(QuestionType::Checkboxes),
            other => Err(IntegrityError::UnknownQuestionType(other.to_string())),
        }
    }
}

/// How a free-form answer is compared against the correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
    Any,
    Float,
    Integer,
    ExactString,
    ContainsString,
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerType::Any => write!(f, "any"),
            AnswerType::Float => write!(f, "float"),
            AnswerType::Integer => write!(f, "integer"),
            AnswerType::ExactString => write!(f, "exact_string"),
            AnswerType::ContainsString => write!(f, "contains_string"),
        }
    }
}

impl FromStr for AnswerType {
    type Err = IntegrityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "any" => Ok(AnswerType::Any),
            "float" | "flt" => Ok(AnswerType::Float),
            "integer" | "int" => Ok(AnswerType::Integer),
            "exact_string" | "exs" => Ok(AnswerType::ExactString),
            "contains_string" | "cts" => Ok(AnswerType::ContainsString),
            other => Err(IntegrityError::UnknownAnswerType(other.to_string())),
        }
    }
}

/// A homework question and its correct answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub id: QuestionId,
    pub question_type: QuestionType,
    /// Only consulted for free-form questions.
    #[serde(default = "default_answer_type")]
    pub answer_type: AnswerType,
    /// Option labels; position `i` is addressed as index `i + 1`.
    #[serde(default)]
    pub possible_answers: Vec<String>,
    /// Comma-separated 1-based indices for choice types, a literal otherwise.
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default = "default_points")]
    pub points_for_correct: u32,
}

fn default_answer_type() -> AnswerType {
    AnswerType::Any
}

fn default_points() -> u32 {
    1
}

impl QuestionSpec {
    /// Check that the correct answer can be interpreted for this question type.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        if self.question_type.is_choice() {
            for token in index_tokens(&self.correct_answer) {
                let index: usize =
                    token
                        .parse()
                        .map_err(|_| IntegrityError::MalformedCorrectAnswer {
                            question_id: self.id,
                            token: token.to_string(),
                        })?;
                if index == 0 || index > self.possible_answers.len() {
                    return Err(IntegrityError::CorrectIndexOutOfRange {
                        question_id: self.id,
                        index,
                        option_count: self.possible_answers.len(),
                    });
                }
            }
            return Ok(());
        }

        let value = self.correct_answer.trim();
        if value.is_empty() {
            return Ok(());
        }
        let expected = match self.answer_type {
            AnswerType::Integer if value.parse::<i64>().is_err() => "integer",
            AnswerType::Float if value.parse::<f64>().is_err() => "float",
            _ => return Ok(()),
        };
        Err(IntegrityError::UnparsableCorrectAnswer {
            question_id: self.id,
            value: value.to_string(),
            expected,
        })
    }
}

/// A student's raw response to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    #[serde(default)]
    pub text: String,
}

// ---------------------------------------------------------------------------
// Peer review criteria
// ---------------------------------------------------------------------------

/// Whether a reviewer picks one option or any number of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    RadioButtons,
    Checkboxes,
}

impl fmt::Display for CriterionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriterionKind::RadioButtons => write!(f, "radio_buttons"),
            CriterionKind::Checkboxes => write!(f, "checkboxes"),
        }
    }
}

impl FromStr for CriterionKind {
    type Err = IntegrityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "radio_buttons" | "radio" => Ok(CriterionKind::RadioButtons),
            "checkboxes" => Ok(CriterionKind::Checkboxes),
            other => Err(IntegrityError::UnknownCriterionKind(other.to_string())),
        }
    }
}

/// One selectable option of a review criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionOption {
    pub label: String,
    pub score: i32,
}

/// A rubric line reviewers score a project against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCriterion {
    pub id: CriterionId,
    #[serde(default)]
    pub description: String,
    pub kind: CriterionKind,
    #[serde(default)]
    pub options: Vec<CriterionOption>,
}

impl ReviewCriterion {
    pub fn validate(&self) -> Result<(), IntegrityError> {
        if self.options.is_empty() {
            return Err(IntegrityError::EmptyCriterion(self.id));
        }
        Ok(())
    }
}

/// A reviewer's raw answer to one criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaResponse {
    pub criterion_id: CriterionId,
    /// Comma-separated 1-based option indices; empty means no response.
    #[serde(default)]
    pub answer: String,
}

// ---------------------------------------------------------------------------
// Homeworks and projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Homework {
    pub id: HomeworkId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
    /// Overrides the configured learning-in-public cap.
    #[serde(default)]
    pub learning_in_public_cap: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeworkSubmission {
    pub id: SubmissionId,
    pub homework_id: HomeworkId,
    pub enrollment_id: EnrollmentId,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
    #[serde(default)]
    pub faq_contribution: String,
    #[serde(default)]
    pub learning_in_public_links: Vec<String>,
    #[serde(default)]
    pub time_spent_lectures: Option<f64>,
    #[serde(default)]
    pub time_spent_homework: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub criteria: Vec<ReviewCriterion>,
    #[serde(default = "default_peers")]
    pub number_of_peers_to_evaluate: u32,
    #[serde(default)]
    pub points_to_pass: i32,
    /// Overrides the configured points per authored review.
    #[serde(default)]
    pub points_for_peer_review: Option<i32>,
    /// Overrides the configured learning-in-public cap for the project itself.
    #[serde(default)]
    pub learning_in_public_cap: Option<u32>,
    /// Overrides the configured learning-in-public cap per authored review.
    #[serde(default)]
    pub review_learning_in_public_cap: Option<u32>,
}

fn default_peers() -> u32 {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSubmission {
    pub id: SubmissionId,
    pub project_id: ProjectId,
    pub enrollment_id: EnrollmentId,
    #[serde(default)]
    pub faq_contribution: String,
    #[serde(default)]
    pub learning_in_public_links: Vec<String>,
    #[serde(default)]
    pub time_spent: Option<f64>,
}

/// Lifecycle of a peer review assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Assigned,
    Submitted,
}

/// One student's review of another student's project submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReview {
    pub id: ReviewId,
    /// The submission of the student doing the review.
    pub reviewer_submission_id: SubmissionId,
    /// The submission being reviewed.
    pub reviewee_submission_id: SubmissionId,
    pub state: ReviewState,
    #[serde(default)]
    pub responses: Vec<CriteriaResponse>,
    #[serde(default)]
    pub learning_in_public_links: Vec<String>,
}

impl PeerReview {
    pub fn is_submitted(&self) -> bool {
        self.state == ReviewState::Submitted
    }
}

// ---------------------------------------------------------------------------
// Enrollments and cohorts
// ---------------------------------------------------------------------------

/// A student's membership in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_true")]
    pub display_on_leaderboard: bool,
    #[serde(default)]
    pub total_score: i32,
    #[serde(default)]
    pub position_on_leaderboard: Option<u32>,
}

fn default_true() -> bool {
    true
}

/// Every record belonging to one course offering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub course_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub homeworks: Vec<Homework>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    #[serde(default)]
    pub homework_submissions: Vec<HomeworkSubmission>,
    #[serde(default)]
    pub project_submissions: Vec<ProjectSubmission>,
    #[serde(default)]
    pub peer_reviews: Vec<PeerReview>,
}

// ---------------------------------------------------------------------------
// Wire encoding
// ---------------------------------------------------------------------------

/// Split a comma-separated index list into trimmed, non-empty tokens.
pub fn index_tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Parse newline-delimited option labels, trimming and dropping blank lines.
pub fn parse_possible_answers(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(correct: &str) -> QuestionSpec {
        QuestionSpec {
            id: 1,
            question_type: QuestionType::MultipleChoice,
            answer_type: AnswerType::Any,
            possible_answers: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: correct.into(),
            points_for_correct: 1,
        }
    }

    #[test]
    fn discriminant_display_and_parse() {
        assert_eq!(QuestionType::MultipleChoice.to_string(), "multiple_choice");
        assert_eq!(
            "free-form".parse::<QuestionType>().unwrap(),
            QuestionType::FreeForm
        );
        assert_eq!("CTS".parse::<AnswerType>().unwrap(), AnswerType::ContainsString);
        assert_eq!(
            "radio".parse::<CriterionKind>().unwrap(),
            CriterionKind::RadioButtons
        );
        assert!(matches!(
            "essay".parse::<QuestionType>(),
            Err(IntegrityError::UnknownQuestionType(_))
        ));
        assert!("fraction".parse::<AnswerType>().is_err());
    }

    #[test]
    fn validate_choice_indices() {
        assert!(choice("1, 3").validate().is_ok());
        assert!(choice("").validate().is_ok());
        assert!(matches!(
            choice("4").validate(),
            Err(IntegrityError::CorrectIndexOutOfRange { index: 4, .. })
        ));
        assert!(matches!(
            choice("0").validate(),
            Err(IntegrityError::CorrectIndexOutOfRange { index: 0, .. })
        ));
        assert!(matches!(
            choice("b").validate(),
            Err(IntegrityError::MalformedCorrectAnswer { .. })
        ));
    }

    #[test]
    fn validate_numeric_free_form() {
        let mut q = choice("42.5");
        q.question_type = QuestionType::FreeForm;
        q.answer_type = AnswerType::Integer;
        assert!(matches!(
            q.validate(),
            Err(IntegrityError::UnparsableCorrectAnswer {
                expected: "integer",
                ..
            })
        ));
        q.answer_type = AnswerType::Float;
        assert!(q.validate().is_ok());
    }

    #[test]
    fn empty_criterion_is_rejected() {
        let c = ReviewCriterion {
            id: 7,
            description: String::new(),
            kind: CriterionKind::Checkboxes,
            options: vec![],
        };
        assert_eq!(c.validate(), Err(IntegrityError::EmptyCriterion(7)));
    }

    #[test]
    fn possible_answers_wire_form() {
        let parsed = parse_possible_answers("  yes \n\nno\r\nmaybe\n");
        assert_eq!(parsed, vec!["yes", "no", "maybe"]);
    }

    #[test]
    fn index_tokens_skip_blanks() {
        let tokens: Vec<&str> = index_tokens(" 1,, 2 ,").collect();
        assert_eq!(tokens, vec!["1", "2"]);
        assert_eq!(index_tokens("").count(), 0);
    }
}
