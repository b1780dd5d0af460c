//! cohortgrade CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "cohortgrade",
    version,
    about = "Course cohort grading, statistics and leaderboards"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade cohorts and rebuild their statistics and leaderboards
    Grade {
        /// Path to a .toml cohort file or directory
        #[arg(long)]
        cohort: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Max concurrent grading tasks (overrides config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Skip writing the JSON report
        #[arg(long)]
        no_save: bool,
    },

    /// Compare the leaderboards of two cohort reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate cohort TOML files
    Validate {
        /// Path to cohort file or directory
        #[arg(long)]
        cohort: PathBuf,
    },

    /// Create starter config and example cohort
    Init,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cohortgrade=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            cohort,
            config,
            output,
            parallelism,
            format,
            no_save,
        } => {
            commands::grade::execute(commands::grade::GradeArgs {
                cohort,
                config,
                output,
                parallelism,
                format,
                save: !no_save,
            })
            .await
        }
        Commands::Compare {
            baseline,
            current,
            format,
        } => commands::compare::execute(baseline, current, format),
        Commands::Validate { cohort } => commands::validate::execute(cohort),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
