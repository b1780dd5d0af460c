//! Scoring configuration and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Course-wide scoring defaults and engine knobs.
///
/// Homeworks and projects may override the caps and points individually;
/// anything they leave unset falls back to these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Max concurrent grading tasks during a recompute.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Points for a non-blank FAQ contribution.
    #[serde(default = "default_faq_points")]
    pub faq_points: i32,
    /// Learning-in-public links counted per homework submission.
    #[serde(default = "default_homework_cap")]
    pub homework_learning_in_public_cap: u32,
    /// Learning-in-public links counted per project submission.
    #[serde(default = "default_project_cap")]
    pub project_learning_in_public_cap: u32,
    /// Learning-in-public links counted per authored peer review.
    #[serde(default = "default_review_cap")]
    pub peer_review_learning_in_public_cap: u32,
    /// Points for each submitted peer review a student authors.
    #[serde(default = "default_points_for_peer_review")]
    pub points_for_peer_review: i32,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_parallelism() -> usize {
    4
}
fn default_faq_points() -> i32 {
    1
}
fn default_homework_cap() -> u32 {
    7
}
fn default_project_cap() -> u32 {
    14
}
fn default_review_cap() -> u32 {
    2
}
fn default_points_for_peer_review() -> i32 {
    3
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./cohortgrade-results")
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            faq_points: default_faq_points(),
            homework_learning_in_public_cap: default_homework_cap(),
            project_learning_in_public_cap: default_project_cap(),
            peer_review_learning_in_public_cap: default_review_cap(),
            points_for_peer_review: default_points_for_peer_review(),
            output_dir: default_output_dir(),
        }
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `cohortgrade.toml` in the current directory
/// 2. `~/.config/cohortgrade/config.toml`
///
/// Environment variable overrides: `COHORTGRADE_PARALLELISM`, `COHORTGRADE_OUTPUT_DIR`.
pub fn load_config_from(path: Option<&Path>) -> Result<ScoringConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("cohortgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ScoringConfig::default(),
    };

    if let Ok(value) = std::env::var("COHORTGRADE_PARALLELISM") {
        config.parallelism = value
            .trim()
            .parse()
            .with_context(|| format!("invalid COHORTGRADE_PARALLELISM: '{value}'"))?;
    }
    if let Ok(dir) = std::env::var("COHORTGRADE_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }

    anyhow::ensure!(config.parallelism >= 1, "parallelism must be at least 1");
    Ok(config)
}

/// Parse a TOML config string.
pub fn parse_config_str(content: &str) -> Result<ScoringConfig> {
    Ok(toml::from_str::<ScoringConfig>(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("cohortgrade"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.homework_learning_in_public_cap, 7);
        assert_eq!(config.project_learning_in_public_cap, 14);
        assert_eq!(config.points_for_peer_review, 3);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = parse_config_str(
            r#"
faq_points = 2
homework_learning_in_public_cap = 5
"#,
        )
        .unwrap();
        assert_eq!(config.faq_points, 2);
        assert_eq!(config.homework_learning_in_public_cap, 5);
        assert_eq!(config.project_learning_in_public_cap, 14);
        assert_eq!(config.output_dir, PathBuf::from("./cohortgrade-results"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohortgrade.toml");
        std::fs::write(&path, "points_for_peer_review = 5\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.points_for_peer_review, 5);
    }
}
