//! asa-analysis - completion analysis for course ledgers
//!
//! `analyse` writes the filtered completion and results analysis tables,
//! `module` reports one module's completions by month, and `zero` lists
//! enrolled students with nothing recorded yet.

use anyhow::{Context, Result};
use asa_analysis::commands::{run_analysis, run_module_analysis, run_zero_extraction};
use asa_analysis::prompt::Menu;
use asa_analysis::{FilterList, RowFilter};
use asa_common::{time, CourseFiles, Error, Settings};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// Command-line arguments for asa-analysis
#[derive(Parser, Debug)]
#[command(name = "asa-analysis")]
#[command(about = "Analyse course completion from the course ledgers")]
#[command(version)]
struct Args {
    /// Data folder holding course files and ledgers
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (default: <data folder>/asa.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse completion for every student, optionally filtered
    Analyse {
        /// Course code (must be listed in Course_codes.txt)
        #[arg(short, long)]
        course: String,

        /// Filter as kind:args, e.g. age:18-24, status:!Active (repeatable)
        #[arg(short, long = "filter", value_name = "KIND:ARGS")]
        filters: Vec<String>,

        /// Choose filters from a menu
        #[arg(short, long, conflicts_with = "filters")]
        interactive: bool,

        /// Treat modules with any transferred assessment as transferred
        #[arg(long)]
        exclude_transfers: bool,
    },

    /// Monthly completion counts and completing students for one module
    Module {
        /// Course code (must be listed in Course_codes.txt)
        #[arg(short, long)]
        course: String,

        /// Module name as listed in Modules_<course>.csv
        #[arg(short, long)]
        module: String,
    },

    /// List students with zero completion
    Zero {
        /// Course code (must be listed in Course_codes.txt)
        #[arg(short, long)]
        course: String,

        /// Roster export (default: Assessment_Downloads_<course>.csv)
        #[arg(long)]
        roster: Option<PathBuf>,
    },
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// `Ok(None)` when the user quit at a prompt
fn unless_quit<T>(result: asa_common::Result<T>) -> asa_common::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::Aborted) => Ok(None),
        Err(e) => Err(e),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref(), args.data_dir.as_deref())
        .context("Failed to load configuration")?;

    init_tracing(&settings.config.logging.level);
    info!(
        "Starting ASA Analysis (asa-analysis) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Data folder: {}", settings.data_dir.display());

    match args.command {
        Command::Analyse {
            course,
            filters,
            interactive,
            exclude_transfers,
        } => {
            let files = CourseFiles::open(&settings.data_dir, &course)
                .with_context(|| format!("Cannot open course {}", course))?;
            let mut config = settings.config.analysis.clone();
            if exclude_transfers {
                config.keep_transfers = false;
            }

            let result = if interactive {
                let mut menu = Menu::new();
                unless_quit(run_analysis(&files, &config, time::today(), &mut menu))
            } else {
                let filters = filters
                    .iter()
                    .map(|arg| {
                        arg.parse::<RowFilter>()
                            .with_context(|| format!("Invalid filter '{}'", arg))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let mut list = FilterList::new(filters);
                unless_quit(run_analysis(&files, &config, time::today(), &mut list))
            };
            let outcome = result.with_context(|| format!("Analysis of {} failed", course))?;

            let Some(outcome) = outcome else {
                info!("Quit requested; no analysis was performed");
                return Ok(());
            };
            for filter in &outcome.filters {
                info!("Filter applied: {}", filter);
            }
            info!(
                "Saved {} and {} ({} students)",
                outcome.completion.display(),
                outcome.results.display(),
                outcome.students
            );
            outcome.diagnostics.log_summary("analysis");
        }
        Command::Module { course, module } => {
            let files = CourseFiles::open(&settings.data_dir, &course)
                .with_context(|| format!("Cannot open course {}", course))?;
            let (counts, students) = run_module_analysis(&files, &module)
                .with_context(|| format!("Analysis of module '{}' failed", module))?;
            info!("Saved {} and {}", counts.display(), students.display());
        }
        Command::Zero { course, roster } => {
            let files = CourseFiles::open(&settings.data_dir, &course)
                .with_context(|| format!("Cannot open course {}", course))?;
            let outcome = run_zero_extraction(&files, roster.as_deref())
                .with_context(|| format!("Zero-completion extraction for {} failed", course))?;
            info!("Saved {} ({} students)", outcome.path.display(), outcome.students);
            outcome.diagnostics.log_summary("zero");
        }
    }

    Ok(())
}
