use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cohortgrade_core::answer::evaluate;
use cohortgrade_core::model::{
    AnswerType, CriterionKind, CriterionOption, QuestionSpec, QuestionType, ReviewCriterion,
};
use cohortgrade_core::peer_review::{neutral_score, score_response};

fn question(question_type: QuestionType, answer_type: AnswerType, correct: &str) -> QuestionSpec {
    QuestionSpec {
        id: 1,
        question_type,
        answer_type,
        possible_answers: (1..=8).map(|i| format!("option {i}")).collect(),
        correct_answer: correct.into(),
        points_for_correct: 1,
    }
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    let multiple_choice = question(QuestionType::MultipleChoice, AnswerType::Any, "3");
    group.bench_function("multiple_choice", |b| {
        b.iter(|| evaluate(black_box(&multiple_choice), black_box("3")))
    });

    let checkboxes = question(QuestionType::Checkboxes, AnswerType::Any, "1, 3, 5, 7");
    group.bench_function("checkboxes", |b| {
        b.iter(|| evaluate(black_box(&checkboxes), black_box("7,5, 3,1")))
    });

    let float = question(QuestionType::FreeForm, AnswerType::Float, "3.14159");
    group.bench_function("free_form_float", |b| {
        b.iter(|| evaluate(black_box(&float), black_box(" 3.14159 ")))
    });

    let contains = question(QuestionType::FreeForm, AnswerType::ContainsString, "Spark");
    group.bench_function("free_form_contains", |b| {
        b.iter(|| {
            evaluate(
                black_box(&contains),
                black_box("we used apache spark for the batch jobs"),
            )
        })
    });

    group.finish();
}

fn bench_peer_review(c: &mut Criterion) {
    let mut group = c.benchmark_group("peer_review");

    let criterion = ReviewCriterion {
        id: 1,
        description: "Best practices".into(),
        kind: CriterionKind::Checkboxes,
        options: (0..6)
            .map(|i| CriterionOption {
                label: format!("practice {i}"),
                score: 1,
            })
            .collect(),
    };

    group.bench_function("score_response", |b| {
        b.iter(|| score_response(black_box(&criterion), black_box("1,2,4,6,x,9")))
    });
    group.bench_function("neutral_score", |b| {
        b.iter(|| neutral_score(black_box(&criterion)))
    });

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_peer_review);
criterion_main!(benches);
