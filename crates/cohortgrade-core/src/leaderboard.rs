//! Leaderboard ranking.
//!
//! Uses standard competition ranking: equal totals share a position and the
//! next distinct total skips the tied count (1, 1, 3, ...). Enrollment id
//! ascending only orders entries inside a tie block; it never splits a tie.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Enrollment, EnrollmentId};

/// The ranking input for one enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankInput {
    pub id: EnrollmentId,
    pub total_score: i32,
    pub display_on_leaderboard: bool,
}

impl From<&Enrollment> for RankInput {
    fn from(e: &Enrollment) -> Self {
        Self {
            id: e.id,
            total_score: e.total_score,
            display_on_leaderboard: e.display_on_leaderboard,
        }
    }
}

/// One row of a computed leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub position: u32,
    pub enrollment_id: EnrollmentId,
    pub total_score: i32,
}

/// Enrollment id to position. Enrollments hidden from the leaderboard
/// are absent.
pub type Positions = BTreeMap<EnrollmentId, u32>;

/// Rank the visible enrollments, best first.
pub fn rank_entries(inputs: &[RankInput]) -> Vec<LeaderboardEntry> {
    let mut visible: Vec<&RankInput> = inputs.iter().filter(|e| e.display_on_leaderboard).collect();
    visible.sort_by(|a, b| b.total_score.cmp(&a.total_score).then(a.id.cmp(&b.id)));

    let mut entries = Vec::with_capacity(visible.len());
    let mut position = 0u32;
    let mut previous: Option<i32> = None;
    for (index, input) in visible.into_iter().enumerate() {
        if previous != Some(input.total_score) {
            position = u32::try_from(index + 1).unwrap_or(u32::MAX);
            previous = Some(input.total_score);
        }
        entries.push(LeaderboardEntry {
            position,
            enrollment_id: input.id,
            total_score: input.total_score,
        });
    }
    entries
}

/// Rank and return the position map.
pub fn rank(inputs: &[RankInput]) -> Positions {
    rank_entries(inputs)
        .into_iter()
        .map(|e| (e.enrollment_id, e.position))
        .collect()
}

/// Write positions back onto enrollments; hidden ones are cleared.
pub fn apply_positions(enrollments: &mut [Enrollment], positions: &Positions) {
    for enrollment in enrollments {
        enrollment.position_on_leaderboard = positions.get(&enrollment.id).copied();
    }
}
