//! Data-integrity error types.
//!
//! Malformed student input is never an error: it grades as incorrect or
//! scores zero. These errors are reserved for records that the persistence
//! layer should never have produced, such as a question whose correct answer
//! points past its own option list.

use thiserror::Error;

/// A record violates an invariant the engine relies on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// A question record carries no type at all.
    #[error("question {0} has no type")]
    MissingQuestionType(u64),

    /// A question type string did not name a known type.
    #[error("unknown question type: {0}")]
    UnknownQuestionType(String),

    /// An answer type string did not name a known type.
    #[error("unknown answer type: {0}")]
    UnknownAnswerType(String),

    /// A review criterion kind string did not name a known kind.
    #[error("unknown criterion kind: {0}")]
    UnknownCriterionKind(String),

    /// A choice question's correct answer references a missing option.
    #[error("question {question_id}: correct answer index {index} is outside 1..={option_count}")]
    CorrectIndexOutOfRange {
        question_id: u64,
        index: usize,
        option_count: usize,
    },

    /// A choice question's correct answer contains a non-numeric token.
    #[error("question {question_id}: correct answer token '{token}' is not an option index")]
    MalformedCorrectAnswer { question_id: u64, token: String },

    /// A numeric free-form question's correct answer does not parse.
    #[error("question {question_id}: correct answer '{value}' is not a valid {expected}")]
    UnparsableCorrectAnswer {
        question_id: u64,
        value: String,
        expected: &'static str,
    },

    /// A review criterion has no options to choose from.
    #[error("criterion {0} has no options")]
    EmptyCriterion(u64),

    /// Two records of the same kind share an id.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: u64 },

    /// An enrollment has more than one submission for the same homework or project.
    #[error("enrollment {enrollment_id} submitted {kind} {parent_id} more than once")]
    DuplicateSubmission {
        kind: &'static str,
        parent_id: u64,
        enrollment_id: u64,
    },

    /// A record refers to an id that does not exist.
    #[error("{kind} {id} referenced by {referrer} does not exist")]
    DanglingReference {
        kind: &'static str,
        id: u64,
        referrer: String,
    },
}

impl IntegrityError {
    /// Returns `true` for errors that make the record ungradable.
    ///
    /// Dangling references only invalidate the referring record, so callers
    /// may choose to drop it and carry on.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, IntegrityError::DanglingReference { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangling_reference_is_not_fatal() {
        let err = IntegrityError::DanglingReference {
            kind: "question",
            id: 9,
            referrer: "homework submission 3".into(),
        };
        assert!(!err.is_fatal());
        assert!(IntegrityError::EmptyCriterion(1).is_fatal());
        assert!(IntegrityError::DuplicateSubmission {
            kind: "homework",
            parent_id: 1,
            enrollment_id: 2,
        }
        .is_fatal());
    }

    #[test]
    fn messages_name_the_record() {
        let err = IntegrityError::CorrectIndexOutOfRange {
            question_id: 4,
            index: 5,
            option_count: 3,
        };
        assert_eq!(
            err.to_string(),
            "question 4: correct answer index 5 is outside 1..=3"
        );
    }
}
