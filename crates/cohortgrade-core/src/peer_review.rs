//! Peer review scoring.
//!
//! A reviewer answers each project criterion with a comma-separated list of
//! 1-based option indices. The score of a response is the sum of the selected
//! options' scores; indices that do not resolve contribute nothing.

use crate::model::{index_tokens, CriterionKind, ReviewCriterion};

/// Score one criterion response.
///
/// Duplicate indices are summed as given: the submitting UI guarantees
/// uniqueness, so the engine does not second-guess it.
pub fn score_response(criterion: &ReviewCriterion, raw: &str) -> i32 {
    index_tokens(raw)
        .filter_map(|token| {
            let score = token
                .parse::<usize>()
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| criterion.options.get(i))
                .map(|option| option.score);
            if score.is_none() {
                tracing::debug!(
                    criterion_id = criterion.id,
                    token,
                    "criterion response token does not resolve to an option"
                );
            }
            score
        })
        .sum()
}

/// The "fair middle" score used when a review is absent.
///
/// Radio buttons use the median option score; checkboxes use half of the
/// total. Both round up.
pub fn neutral_score(criterion: &ReviewCriterion) -> i32 {
    let mut scores: Vec<i32> = criterion.options.iter().map(|o| o.score).collect();
    match criterion.kind {
        CriterionKind::RadioButtons => median_rounded_up(&mut scores).unwrap_or(0),
        CriterionKind::Checkboxes => half_rounded_up(scores.iter().map(|&s| i64::from(s)).sum()),
    }
}

/// Median of integer scores, rounded up. `None` when there are no scores.
pub fn median_rounded_up(scores: &mut [i32]) -> Option<i32> {
    if scores.is_empty() {
        return None;
    }
    scores.sort_unstable();
    let mid = scores.len() / 2;
    if scores.len() % 2 == 1 {
        Some(scores[mid])
    } else {
        Some(half_rounded_up(
            i64::from(scores[mid - 1]) + i64::from(scores[mid]),
        ))
    }
}

fn half_rounded_up(total: i64) -> i32 {
    // div_euclid floors, so adding one before halving rounds .5 toward +inf.
    let halved = (total + 1).div_euclid(2);
    i32::try_from(halved).unwrap_or(if halved > 0 { i32::MAX } else { i32::MIN })
}
