//! The `cohortgrade compare` command.

use std::path::PathBuf;

use anyhow::Result;

use cohortgrade_core::report::CohortReport;

pub fn execute(baseline_path: PathBuf, current_path: PathBuf, format: String) -> Result<()> {
    let baseline = CohortReport::load_json(&baseline_path)?;
    let current = CohortReport::load_json(&current_path)?;

    if baseline.course.id != current.course.id {
        eprintln!(
            "Warning: comparing different courses ({} vs {})",
            baseline.course.id, current.course.id
        );
    }

    let report = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            println!(
                "Comparison: {} risers, {} fallers, {} unchanged",
                report.risers.len(),
                report.fallers.len(),
                report.unchanged
            );

            if !report.risers.is_empty() {
                println!("\nRisers:");
                for m in &report.risers {
                    println!(
                        "  enrollment {} #{} -> #{} ({:+} places, {:+} points)",
                        m.enrollment_id,
                        m.baseline_position,
                        m.current_position,
                        m.delta,
                        m.score_delta
                    );
                }
            }

            if !report.fallers.is_empty() {
                println!("\nFallers:");
                for m in &report.fallers {
                    println!(
                        "  enrollment {} #{} -> #{} ({:+} places, {:+} points)",
                        m.enrollment_id,
                        m.baseline_position,
                        m.current_position,
                        m.delta,
                        m.score_delta
                    );
                }
            }

            if !report.entered.is_empty() {
                println!("\n{} enrollment(s) entered the leaderboard", report.entered.len());
            }
            if !report.left.is_empty() {
                println!("{} enrollment(s) left the leaderboard", report.left.len());
            }
        }
    }

    Ok(())
}
