//! TOML cohort file parser.
//!
//! Loads cohorts from TOML files and directories, and validates them.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::IntegrityError;
use crate::model::{
    parse_possible_answers, AnswerType, Cohort, CriterionOption, Enrollment, Homework,
    HomeworkSubmission, PeerReview, Project, ProjectSubmission, QuestionSpec, QuestionType,
    ReviewCriterion,
};

/// Intermediate TOML structure for parsing cohort files.
#[derive(Debug, Deserialize)]
struct TomlCohortFile {
    course: TomlCourseHeader,
    #[serde(default)]
    homeworks: Vec<TomlHomework>,
    #[serde(default)]
    projects: Vec<TomlProject>,
    #[serde(default)]
    enrollments: Vec<Enrollment>,
    #[serde(default)]
    homework_submissions: Vec<HomeworkSubmission>,
    #[serde(default)]
    project_submissions: Vec<ProjectSubmission>,
    #[serde(default)]
    peer_reviews: Vec<PeerReview>,
}

#[derive(Debug, Deserialize)]
struct TomlCourseHeader {
    id: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct TomlHomework {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
    #[serde(default)]
    learning_in_public_cap: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u64,
    #[serde(rename = "type", default)]
    question_type: Option<String>,
    #[serde(default)]
    answer_type: Option<String>,
    #[serde(default)]
    possible_answers: Option<TomlOptions>,
    #[serde(default)]
    correct_answer: String,
    #[serde(default = "default_points")]
    points: u32,
}

/// Options are stored newline-delimited, but a TOML array reads better
/// when writing cohort files by hand.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlOptions {
    Lines(String),
    List(Vec<String>),
}

fn default_points() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct TomlProject {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    criteria: Vec<TomlCriterion>,
    #[serde(default = "default_peers")]
    number_of_peers_to_evaluate: u32,
    #[serde(default)]
    points_to_pass: i32,
    #[serde(default)]
    points_for_peer_review: Option<i32>,
    #[serde(default)]
    learning_in_public_cap: Option<u32>,
    #[serde(default)]
    review_learning_in_public_cap: Option<u32>,
}

fn default_peers() -> u32 {
    3
}

#[derive(Debug, Deserialize)]
struct TomlCriterion {
    id: u64,
    #[serde(default)]
    description: String,
    kind: String,
    #[serde(default)]
    options: Vec<CriterionOption>,
}

/// Parse a single TOML file into a `Cohort`.
pub fn parse_cohort(path: &Path) -> Result<Cohort> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cohort file: {}", path.display()))?;

    parse_cohort_str(&content, path)
}

/// Parse a TOML string into a `Cohort` (useful for testing).
pub fn parse_cohort_str(content: &str, source_path: &Path) -> Result<Cohort> {
    let parsed: TomlCohortFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let homeworks = parsed
        .homeworks
        .into_iter()
        .map(|h| {
            let questions = h
                .questions
                .into_iter()
                .map(convert_question)
                .collect::<Result<Vec<_>, IntegrityError>>()
                .with_context(|| format!("homework {} in {}", h.id, source_path.display()))?;
            Ok(Homework {
                id: h.id,
                title: h.title,
                questions,
                learning_in_public_cap: h.learning_in_public_cap,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let projects = parsed
        .projects
        .into_iter()
        .map(|p| {
            let criteria = p
                .criteria
                .into_iter()
                .map(|c| {
                    Ok(ReviewCriterion {
                        id: c.id,
                        description: c.description,
                        kind: c.kind.parse()?,
                        options: c.options,
                    })
                })
                .collect::<Result<Vec<_>, IntegrityError>>()
                .with_context(|| format!("project {} in {}", p.id, source_path.display()))?;
            Ok(Project {
                id: p.id,
                title: p.title,
                criteria,
                number_of_peers_to_evaluate: p.number_of_peers_to_evaluate,
                points_to_pass: p.points_to_pass,
                points_for_peer_review: p.points_for_peer_review,
                learning_in_public_cap: p.learning_in_public_cap,
                review_learning_in_public_cap: p.review_learning_in_public_cap,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Cohort {
        course_id: parsed.course.id,
        title: parsed.course.title,
        homeworks,
        projects,
        enrollments: parsed.enrollments,
        homework_submissions: parsed.homework_submissions,
        project_submissions: parsed.project_submissions,
        peer_reviews: parsed.peer_reviews,
    })
}

fn convert_question(q: TomlQuestion) -> Result<QuestionSpec, IntegrityError> {
    let question_type: QuestionType = q
        .question_type
        .ok_or(IntegrityError::MissingQuestionType(q.id))?
        .parse()?;
    let answer_type = match q.answer_type {
        Some(raw) => raw.parse()?,
        None => AnswerType::Any,
    };
    let possible_answers = match q.possible_answers {
        Some(TomlOptions::Lines(raw)) => parse_possible_answers(&raw),
        Some(TomlOptions::List(list)) => list
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };

    Ok(QuestionSpec {
        id: q.id,
        question_type,
        answer_type,
        possible_answers,
        correct_answer: q.correct_answer,
        points_for_correct: q.points,
    })
}

/// Recursively load all `.toml` cohort files from a directory.
pub fn load_cohort_directory(dir: &Path) -> Result<Vec<Cohort>> {
    let mut cohorts = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            cohorts.extend(load_cohort_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_cohort(&path) {
                Ok(cohort) => cohorts.push(cohort),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(cohorts)
}

/// A soft issue that does not stop grading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The record the warning is about, e.g. "homework 3".
    pub record: Option<String>,
    pub message: String,
}

/// Outcome of [`validate_cohort`].
#[derive(Debug, Clone, Default)]
pub struct CohortValidation {
    pub errors: Vec<IntegrityError>,
    pub warnings: Vec<ValidationWarning>,
}

impl CohortValidation {
    /// True when no error makes a record ungradable.
    pub fn is_gradable(&self) -> bool {
        !self.errors.iter().any(IntegrityError::is_fatal)
    }

    /// Fail with every fatal error listed when the cohort is not gradable.
    pub fn ensure_gradable(&self, course_id: &str) -> Result<()> {
        if self.is_gradable() {
            return Ok(());
        }
        let errors: Vec<String> = self
            .errors
            .iter()
            .filter(|e| e.is_fatal())
            .map(|e| format!("  {e}"))
            .collect();
        anyhow::bail!(
            "course '{course_id}' has {} integrity error(s):\n{}",
            errors.len(),
            errors.join("\n")
        )
    }

    fn warn(&mut self, record: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            record: Some(record.into()),
            message: message.into(),
        });
    }
}

fn check_unique<I>(kind: &'static str, ids: I, errors: &mut Vec<IntegrityError>)
where
    I: IntoIterator<Item = u64>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(IntegrityError::DuplicateId { kind, id });
        }
    }
}

/// Each enrollment submits at most once per homework or project.
fn check_one_per_enrollment<I>(kind: &'static str, pairs: I, errors: &mut Vec<IntegrityError>)
where
    I: IntoIterator<Item = (u64, u64)>,
{
    let mut seen = HashSet::new();
    for (parent_id, enrollment_id) in pairs {
        if !seen.insert((parent_id, enrollment_id)) {
            errors.push(IntegrityError::DuplicateSubmission {
                kind,
                parent_id,
                enrollment_id,
            });
        }
    }
}

/// Validate a cohort for integrity errors and common issues.
pub fn validate_cohort(cohort: &Cohort) -> CohortValidation {
    let mut out = CohortValidation::default();

    check_unique("homework", cohort.homeworks.iter().map(|h| h.id), &mut out.errors);
    check_unique("project", cohort.projects.iter().map(|p| p.id), &mut out.errors);
    check_unique("enrollment", cohort.enrollments.iter().map(|e| e.id), &mut out.errors);
    check_unique(
        "homework submission",
        cohort.homework_submissions.iter().map(|s| s.id),
        &mut out.errors,
    );
    check_unique(
        "project submission",
        cohort.project_submissions.iter().map(|s| s.id),
        &mut out.errors,
    );
    check_unique("peer review", cohort.peer_reviews.iter().map(|r| r.id), &mut out.errors);
    check_one_per_enrollment(
        "homework",
        cohort
            .homework_submissions
            .iter()
            .map(|s| (s.homework_id, s.enrollment_id)),
        &mut out.errors,
    );
    check_one_per_enrollment(
        "project",
        cohort
            .project_submissions
            .iter()
            .map(|s| (s.project_id, s.enrollment_id)),
        &mut out.errors,
    );

    for homework in &cohort.homeworks {
        check_unique("question", homework.questions.iter().map(|q| q.id), &mut out.errors);
        if homework.questions.is_empty() {
            out.warn(format!("homework {}", homework.id), "homework has no questions");
        }
        for question in &homework.questions {
            if let Err(e) = question.validate() {
                out.errors.push(e);
            }
        }
    }

    for project in &cohort.projects {
        check_unique("criterion", project.criteria.iter().map(|c| c.id), &mut out.errors);
        if project.criteria.is_empty() {
            out.warn(format!("project {}", project.id), "project has no review criteria");
        }
        if project.number_of_peers_to_evaluate == 0 {
            out.warn(
                format!("project {}", project.id),
                "number_of_peers_to_evaluate is 0; every submission counts as reviewed enough",
            );
        }
        for criterion in &project.criteria {
            if let Err(e) = criterion.validate() {
                out.errors.push(e);
            }
        }
    }

    let enrollments: HashSet<u64> = cohort.enrollments.iter().map(|e| e.id).collect();
    let homeworks: HashMap<u64, &Homework> = cohort.homeworks.iter().map(|h| (h.id, h)).collect();
    let projects: HashMap<u64, &Project> = cohort.projects.iter().map(|p| (p.id, p)).collect();

    for submission in &cohort.homework_submissions {
        let referrer = format!("homework submission {}", submission.id);
        if !enrollments.contains(&submission.enrollment_id) {
            out.errors.push(IntegrityError::DanglingReference {
                kind: "enrollment",
                id: submission.enrollment_id,
                referrer: referrer.clone(),
            });
        }
        let Some(homework) = homeworks.get(&submission.homework_id) else {
            out.errors.push(IntegrityError::DanglingReference {
                kind: "homework",
                id: submission.homework_id,
                referrer,
            });
            continue;
        };

        let mut answered = HashSet::new();
        for answer in &submission.answers {
            if !homework.questions.iter().any(|q| q.id == answer.question_id) {
                out.errors.push(IntegrityError::DanglingReference {
                    kind: "question",
                    id: answer.question_id,
                    referrer: referrer.clone(),
                });
            } else if !answered.insert(answer.question_id) {
                out.warn(
                    referrer.clone(),
                    format!(
                        "question {} answered more than once; the first answer is graded",
                        answer.question_id
                    ),
                );
            }
        }
    }

    let mut submission_projects = HashMap::new();
    for submission in &cohort.project_submissions {
        let referrer = format!("project submission {}", submission.id);
        if !enrollments.contains(&submission.enrollment_id) {
            out.errors.push(IntegrityError::DanglingReference {
                kind: "enrollment",
                id: submission.enrollment_id,
                referrer: referrer.clone(),
            });
        }
        if !projects.contains_key(&submission.project_id) {
            out.errors.push(IntegrityError::DanglingReference {
                kind: "project",
                id: submission.project_id,
                referrer,
            });
        }
        submission_projects.insert(submission.id, submission.project_id);
    }

    for review in &cohort.peer_reviews {
        let referrer = format!("peer review {}", review.id);
        let reviewer = submission_projects.get(&review.reviewer_submission_id);
        let reviewee = submission_projects.get(&review.reviewee_submission_id);
        for (id, found) in [
            (review.reviewer_submission_id, reviewer),
            (review.reviewee_submission_id, reviewee),
        ] {
            if found.is_none() {
                out.errors.push(IntegrityError::DanglingReference {
                    kind: "project submission",
                    id,
                    referrer: referrer.clone(),
                });
            }
        }
        if review.reviewer_submission_id == review.reviewee_submission_id {
            out.warn(referrer.clone(), "submission reviews itself");
        }
        if let (Some(a), Some(b)) = (reviewer, reviewee) {
            if a != b {
                out.warn(referrer.clone(), "reviewer and reviewee belong to different projects");
            }
        }
        if let Some(project) = reviewee.and_then(|id| projects.get(id)) {
            for response in &review.responses {
                if !project.criteria.iter().any(|c| c.id == response.criterion_id) {
                    out.errors.push(IntegrityError::DanglingReference {
                        kind: "criterion",
                        id: response.criterion_id,
                        referrer: referrer.clone(),
                    });
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CriterionKind, ReviewState};
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[course]
id = "data-eng-2026"
title = "Data Engineering 2026"

[[homeworks]]
id = 1
title = "Week 1"

[[homeworks.questions]]
id = 1
type = "multiple_choice"
possible_answers = """
Parquet
CSV

Avro
"""
correct_answer = "1"
points = 2

[[homeworks.questions]]
id = 2
type = "free_form"
answer_type = "integer"
correct_answer = "42"

[[projects]]
id = 1
title = "Capstone"
points_to_pass = 5

[[projects.criteria]]
id = 1
description = "Problem description"
kind = "radio_buttons"
options = [
    { label = "Not described", score = 0 },
    { label = "Well described", score = 2 },
]

[[enrollments]]
id = 1
display_name = "Ada"

[[enrollments]]
id = 2
display_on_leaderboard = false

[[homework_submissions]]
id = 1
homework_id = 1
enrollment_id = 1
faq_contribution = "How to install spark"
learning_in_public_links = ["https://example.com/a"]
answers = [
    { question_id = 1, text = "1" },
    { question_id = 2, text = "42" },
]

[[project_submissions]]
id = 10
project_id = 1
enrollment_id = 1

[[project_submissions]]
id = 11
project_id = 1
enrollment_id = 2

[[peer_reviews]]
id = 1
reviewer_submission_id = 11
reviewee_submission_id = 10
state = "submitted"
responses = [{ criterion_id = 1, answer = "2" }]
"#;

    fn parse(content: &str) -> Cohort {
        parse_cohort_str(content, &PathBuf::from("test.toml")).unwrap()
    }

    #[test]
    fn parse_valid_toml() {
        let cohort = parse(VALID_TOML);
        assert_eq!(cohort.course_id, "data-eng-2026");
        assert_eq!(cohort.homeworks.len(), 1);

        let q1 = &cohort.homeworks[0].questions[0];
        assert_eq!(q1.question_type, QuestionType::MultipleChoice);
        assert_eq!(q1.possible_answers, vec!["Parquet", "CSV", "Avro"]);
        assert_eq!(q1.points_for_correct, 2);

        let q2 = &cohort.homeworks[0].questions[1];
        assert_eq!(q2.answer_type, AnswerType::Integer);
        assert_eq!(q2.points_for_correct, 1);

        assert_eq!(cohort.projects[0].criteria[0].kind, CriterionKind::RadioButtons);
        assert_eq!(cohort.projects[0].number_of_peers_to_evaluate, 3);
        assert!(!cohort.enrollments[1].display_on_leaderboard);
        assert_eq!(cohort.peer_reviews[0].state, ReviewState::Submitted);

        let validation = validate_cohort(&cohort);
        assert!(validation.errors.is_empty(), "{:?}", validation.errors);
        assert!(validation.is_gradable());
    }

    #[test]
    fn options_may_be_an_array() {
        let toml = r#"
[course]
id = "c"

[[homeworks]]
id = 1

[[homeworks.questions]]
id = 1
type = "checkboxes"
possible_answers = [" a ", "", "b"]
correct_answer = "1,2"
"#;
        let cohort = parse(toml);
        assert_eq!(cohort.homeworks[0].questions[0].possible_answers, vec!["a", "b"]);
    }

    #[test]
    fn missing_question_type_is_rejected() {
        let toml = r#"
[course]
id = "c"

[[homeworks]]
id = 1

[[homeworks.questions]]
id = 7
correct_answer = "x"
"#;
        let err = parse_cohort_str(toml, &PathBuf::from("t.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("question 7 has no type"));
    }

    #[test]
    fn unknown_criterion_kind_is_rejected() {
        let toml = r#"
[course]
id = "c"

[[projects]]
id = 1

[[projects.criteria]]
id = 1
kind = "slider"
"#;
        let err = parse_cohort_str(toml, &PathBuf::from("t.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown criterion kind"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_cohort_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_reports_integrity_errors() {
        let mut cohort = parse(VALID_TOML);
        cohort.homeworks[0].questions[0].correct_answer = "4".into();
        cohort.homework_submissions[0].enrollment_id = 99;
        cohort.peer_reviews[0].reviewer_submission_id = 10;

        let validation = validate_cohort(&cohort);
        assert!(validation.errors.contains(&IntegrityError::CorrectIndexOutOfRange {
            question_id: 1,
            index: 4,
            option_count: 3,
        }));
        assert!(validation.errors.iter().any(|e| matches!(
            e,
            IntegrityError::DanglingReference { kind: "enrollment", id: 99, .. }
        )));
        assert!(!validation.is_gradable());
        assert!(validation
            .warnings
            .iter()
            .any(|w| w.message.contains("reviews itself")));
    }

    #[test]
    fn validate_warns_on_soft_issues() {
        let mut cohort = parse(VALID_TOML);
        cohort.homeworks.push(Homework {
            id: 2,
            title: "Empty".into(),
            questions: vec![],
            learning_in_public_cap: None,
        });
        cohort.projects[0].number_of_peers_to_evaluate = 0;
        let duplicate = cohort.homework_submissions[0].answers[0].clone();
        cohort.homework_submissions[0].answers.push(duplicate);
        cohort.enrollments.push(cohort.enrollments[0].clone());

        let validation = validate_cohort(&cohort);
        let messages: Vec<&str> = validation
            .warnings
            .iter()
            .map(|w| w.message.as_str())
            .collect();
        assert!(messages.iter().any(|m| m.contains("no questions")));
        assert!(messages.iter().any(|m| m.contains("number_of_peers_to_evaluate is 0")));
        assert!(messages.iter().any(|m| m.contains("answered more than once")));
        assert_eq!(
            validation.errors,
            vec![IntegrityError::DuplicateId {
                kind: "enrollment",
                id: 1
            }]
        );
    }

    #[test]
    fn second_submission_by_same_enrollment_is_an_error() {
        let mut cohort = parse(VALID_TOML);
        let mut again = cohort.homework_submissions[0].clone();
        again.id = 2;
        cohort.homework_submissions.push(again);
        cohort.project_submissions[1].enrollment_id = 1;

        let validation = validate_cohort(&cohort);
        assert_eq!(
            validation.errors,
            vec![
                IntegrityError::DuplicateSubmission {
                    kind: "homework",
                    parent_id: 1,
                    enrollment_id: 1,
                },
                IntegrityError::DuplicateSubmission {
                    kind: "project",
                    parent_id: 1,
                    enrollment_id: 1,
                },
            ]
        );
        let err = validation.ensure_gradable("data-eng-2026").unwrap_err();
        assert!(err
            .to_string()
            .contains("course 'data-eng-2026' has 2 integrity error(s)"));
    }

    #[test]
    fn ensure_gradable_ignores_dangling_references() {
        let mut cohort = parse(VALID_TOML);
        cohort.homework_submissions[0].homework_id = 9;
        let validation = validate_cohort(&cohort);
        assert_eq!(validation.errors.len(), 1);
        assert!(validation.ensure_gradable("data-eng-2026").is_ok());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("course.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not = [valid").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let cohorts = load_cohort_directory(dir.path()).unwrap();
        assert_eq!(cohorts.len(), 1);
        assert_eq!(cohorts[0].course_id, "data-eng-2026");
    }

    #[test]
    fn load_directory_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("course.toml");
        std::fs::write(&file, VALID_TOML).unwrap();
        assert!(load_cohort_directory(&file).is_err());
    }
}
