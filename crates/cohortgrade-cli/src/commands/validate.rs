//! The `cohortgrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use cohortgrade_core::parser::validate_cohort;

use super::load_cohorts;

pub fn execute(cohort_path: PathBuf) -> Result<()> {
    let cohorts = load_cohorts(&cohort_path)?;

    let mut total_warnings = 0;
    let mut total_errors = 0;

    for cohort in &cohorts {
        println!(
            "Cohort: {} ({} homeworks, {} projects, {} enrollments)",
            cohort.course_id,
            cohort.homeworks.len(),
            cohort.projects.len(),
            cohort.enrollments.len()
        );

        let validation = validate_cohort(cohort);
        for e in &validation.errors {
            println!("  ERROR: {e}");
        }
        for w in &validation.warnings {
            let prefix = w
                .record
                .as_ref()
                .map(|r| format!("  [{r}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_errors += validation.errors.len();
        total_warnings += validation.warnings.len();
    }

    anyhow::ensure!(
        total_errors == 0,
        "{total_errors} integrity error(s) found"
    );

    if total_warnings == 0 {
        println!("All cohorts valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
