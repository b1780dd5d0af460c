//! The `cohortgrade init` command.

use std::path::Path;

use anyhow::{Context, Result};

use cohortgrade_core::config::ScoringConfig;

const EXAMPLE_COHORT: &str = include_str!("../../../../cohorts/example.toml");

pub fn execute() -> Result<()> {
    // Create cohortgrade.toml from the built-in defaults
    if Path::new("cohortgrade.toml").exists() {
        println!("cohortgrade.toml already exists, skipping.");
    } else {
        let defaults = toml::to_string_pretty(&ScoringConfig::default())
            .context("failed to serialize default config")?;
        std::fs::write("cohortgrade.toml", format!("{CONFIG_HEADER}{defaults}"))?;
        println!("Created cohortgrade.toml");
    }

    // Create example cohort
    std::fs::create_dir_all("cohorts")?;
    let example_path = Path::new("cohorts/example.toml");
    if example_path.exists() {
        println!("cohorts/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_COHORT)?;
        println!("Created cohorts/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Adjust caps and points in cohortgrade.toml");
    println!("  2. Run: cohortgrade validate --cohort cohorts/example.toml");
    println!("  3. Run: cohortgrade grade --cohort cohorts/example.toml");

    Ok(())
}

const CONFIG_HEADER: &str = "\
# cohortgrade configuration
#
# Homeworks and projects may override the learning-in-public caps and the
# points per peer review individually. COHORTGRADE_PARALLELISM and
# COHORTGRADE_OUTPUT_DIR override the values below.

";
