pub mod compare;
pub mod grade;
pub mod init;
pub mod validate;

use std::path::Path;

use anyhow::Result;
use cohortgrade_core::model::Cohort;
use cohortgrade_core::parser;

/// Load a single cohort file, or every cohort under a directory.
pub fn load_cohorts(path: &Path) -> Result<Vec<Cohort>> {
    if path.is_dir() {
        parser::load_cohort_directory(path)
    } else {
        Ok(vec![parser::parse_cohort(path)?])
    }
}
