//! cohortgrade-core — Scoring and statistics engine for course cohorts.
//!
//! This crate grades homework answers, aggregates peer reviews into project
//! scores, rolls everything up into enrollment totals and a leaderboard, and
//! summarizes each homework and project with descriptive statistics.

pub mod aggregate;
pub mod answer;
pub mod config;
pub mod engine;
pub mod error;
pub mod leaderboard;
pub mod memory;
pub mod model;
pub mod names;
pub mod parser;
pub mod peer_review;
pub mod report;
pub mod results;
pub mod statistics;
pub mod traits;
