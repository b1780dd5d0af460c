//! Grading a single answer against its question.
//!
//! Choice answers use the same wire form as the question's correct answer:
//! comma-separated 1-based option indices. Both sides are resolved to option
//! labels and compared as sets, so order never matters and partial selections
//! never earn credit.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{index_tokens, AnswerType, QuestionId, QuestionSpec, SubmittedAnswer};

/// Absolute tolerance for float answers.
pub const FLOAT_TOLERANCE: f64 = 1e-9;

/// Outcome of grading one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub is_correct: bool,
}

/// A submitted answer together with its grading outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: QuestionId,
    pub is_correct: bool,
    /// Points earned; zero unless correct.
    pub points: u32,
}

/// Grade `raw` against `question`.
pub fn evaluate(question: &QuestionSpec, raw: &str) -> Evaluation {
    let is_correct = if question.question_type.is_choice() {
        evaluate_choice(question, raw)
    } else {
        evaluate_free_form(question.answer_type, &question.correct_answer, raw)
    };
    Evaluation { is_correct }
}

/// Grade a submitted answer and attach the points it earns.
pub fn grade(question: &QuestionSpec, answer: &SubmittedAnswer) -> GradedAnswer {
    let Evaluation { is_correct } = evaluate(question, &answer.text);
    GradedAnswer {
        question_id: question.id,
        is_correct,
        points: if is_correct {
            question.points_for_correct
        } else {
            0
        },
    }
}

/// Labels referenced by the question's correct answer.
///
/// Empty when any token is not an index or falls outside the option list,
/// so a corrupt correct answer never matches.
pub fn correct_labels(question: &QuestionSpec) -> BTreeSet<&str> {
    index_tokens(&question.correct_answer)
        .map(|token| resolve_label(&question.possible_answers, token))
        .collect::<Option<BTreeSet<_>>>()
        .unwrap_or_else(|| {
            tracing::debug!(
                question_id = question.id,
                "correct answer does not resolve to options"
            );
            BTreeSet::new()
        })
}

fn evaluate_choice(question: &QuestionSpec, raw: &str) -> bool {
    let correct = correct_labels(question);
    if correct.is_empty() {
        return false;
    }

    let mut submitted = BTreeSet::new();
    for token in index_tokens(raw) {
        match resolve_label(&question.possible_answers, token) {
            Some(label) => {
                submitted.insert(label);
            }
            None => {
                tracing::debug!(
                    question_id = question.id,
                    token,
                    "submitted choice token does not resolve to an option"
                );
                return false;
            }
        }
    }

    submitted == correct
}

fn resolve_label<'a>(options: &'a [String], token: &str) -> Option<&'a str> {
    let index: usize = token.parse().ok()?;
    index
        .checked_sub(1)
        .and_then(|i| options.get(i))
        .map(String::as_str)
}

fn evaluate_free_form(answer_type: AnswerType, correct: &str, raw: &str) -> bool {
    let submitted = raw.trim();
    let correct = correct.trim();

    if answer_type != AnswerType::Any && correct.is_empty() {
        return false;
    }

    match answer_type {
        AnswerType::Any => !submitted.is_empty(),
        AnswerType::ExactString => submitted == correct,
        AnswerType::ContainsString => submitted
            .to_lowercase()
            .contains(&correct.to_lowercase()),
        AnswerType::Integer => match (submitted.parse::<i64>(), correct.parse::<i64>()) {
            (Ok(s), Ok(c)) => s == c,
            _ => false,
        },
        AnswerType::Float => match (submitted.parse::<f64>(), correct.parse::<f64>()) {
            (Ok(s), Ok(c)) => (s - c).abs() <= FLOAT_TOLERANCE,
            _ => false,
        },
    }
}
