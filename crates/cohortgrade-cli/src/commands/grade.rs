//! The `cohortgrade grade` command.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use comfy_table::{Cell, Table};

use cohortgrade_core::config::load_config_from;
use cohortgrade_core::engine::RecomputeEngine;
use cohortgrade_core::memory::MemoryStore;
use cohortgrade_core::parser::validate_cohort;
use cohortgrade_core::report::{CohortReport, CourseSummary};
use cohortgrade_core::statistics::Subject;

use super::load_cohorts;

pub struct GradeArgs {
    pub cohort: PathBuf,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub parallelism: Option<usize>,
    pub format: String,
    pub save: bool,
}

pub async fn execute(args: GradeArgs) -> Result<()> {
    anyhow::ensure!(
        matches!(args.format.as_str(), "text" | "json"),
        "unknown format '{}': expected text or json",
        args.format
    );

    let mut config = load_config_from(args.config.as_deref())?;
    if let Some(parallelism) = args.parallelism {
        anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
        config.parallelism = parallelism;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }

    let cohorts = load_cohorts(&args.cohort)?;
    anyhow::ensure!(
        !cohorts.is_empty(),
        "no cohort files found in {}",
        args.cohort.display()
    );

    let mut seen = HashSet::new();
    let mut summaries = Vec::with_capacity(cohorts.len());
    for cohort in &cohorts {
        anyhow::ensure!(
            seen.insert(cohort.course_id.clone()),
            "course '{}' is defined more than once",
            cohort.course_id
        );

        let validation = validate_cohort(cohort);
        for w in &validation.warnings {
            tracing::warn!(
                course_id = %cohort.course_id,
                record = w.record.as_deref().unwrap_or("-"),
                "{}",
                w.message
            );
        }
        validation.ensure_gradable(&cohort.course_id)?;
        for e in validation.errors.iter().filter(|e| !e.is_fatal()) {
            tracing::warn!(course_id = %cohort.course_id, "{e}; record will be skipped");
        }
        summaries.push(CourseSummary::from(cohort));
    }

    let store = MemoryStore::with_cohorts(cohorts);
    let engine = RecomputeEngine::new(config.clone());

    for summary in summaries {
        eprintln!(
            "cohortgrade v{} — Grading {} ({} homeworks, {} projects, {} enrollments)",
            env!("CARGO_PKG_VERSION"),
            summary.id,
            summary.homework_count,
            summary.project_count,
            summary.enrollment_count
        );

        let start = Instant::now();
        let results = engine.recompute_course(&store, &summary.id).await?;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let report = CohortReport::new(summary, results, duration_ms);

        if args.format == "json" {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_leaderboard(&report);
            print_projects(&report);
            print_statistics(&report);
        }

        if args.save {
            let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
            let path = config
                .output_dir
                .join(format!("{}-{timestamp}.json", report.course.id));
            report.save_json(&path)?;
            eprintln!("Report saved to: {}", path.display());
        }
    }

    Ok(())
}

fn print_leaderboard(report: &CohortReport) {
    let names: HashMap<u64, &str> = report
        .results
        .enrollments
        .iter()
        .map(|e| (e.id, e.display_name.as_deref().unwrap_or("-")))
        .collect();

    let mut table = Table::new();
    table.set_header(vec!["#", "Enrollment", "Name", "Total"]);
    for entry in &report.results.leaderboard {
        table.add_row(vec![
            Cell::new(entry.position),
            Cell::new(entry.enrollment_id),
            Cell::new(names.get(&entry.enrollment_id).copied().unwrap_or("-")),
            Cell::new(entry.total_score),
        ]);
    }

    println!("\nLeaderboard: {}\n{table}", report.course.title);
}

fn print_projects(report: &CohortReport) {
    if report.results.projects.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Submission",
        "Project",
        "Enrollment",
        "Score",
        "Reviews",
        "Total",
        "Passed",
    ]);
    for p in &report.results.projects {
        table.add_row(vec![
            Cell::new(p.submission_id),
            Cell::new(p.project_id),
            Cell::new(p.enrollment_id),
            Cell::new(p.scores.project),
            Cell::new(p.reviews_submitted),
            Cell::new(p.total_score),
            Cell::new(if p.passed { "yes" } else { "no" }),
        ]);
    }

    println!("\nProjects\n{table}");
}

fn print_statistics(report: &CohortReport) {
    let mut table = Table::new();
    table.set_header(vec![
        "Subject", "Dimension", "N", "Min", "Q1", "Median", "Mean", "Q3", "Max",
    ]);
    for s in &report.results.statistics {
        let subject = match s.subject {
            Subject::Homework(id) => format!("homework {id}"),
            Subject::Project(id) => format!("project {id}"),
        };
        table.add_row(vec![
            Cell::new(subject),
            Cell::new(&s.dimension),
            Cell::new(s.stats.count),
            Cell::new(fmt_stat(s.stats.min)),
            Cell::new(fmt_stat(s.stats.q1)),
            Cell::new(fmt_stat(s.stats.median)),
            Cell::new(fmt_stat(s.stats.mean)),
            Cell::new(fmt_stat(s.stats.q3)),
            Cell::new(fmt_stat(s.stats.max)),
        ]);
    }

    println!("\nStatistics\n{table}");
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}
