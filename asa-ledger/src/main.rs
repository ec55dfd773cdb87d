//! asa-ledger - course ledger maintenance
//!
//! Creates empty completion/results ledgers and reconciles monthly
//! assessment exports into them. Every update writes a new timestamped
//! snapshot next to the current ledger.

use anyhow::{Context, Result};
use asa_common::{CourseFiles, Settings};
use asa_ledger::update::{create_ledger, LedgerKind, UpdateCycle};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

/// Command-line arguments for asa-ledger
#[derive(Parser, Debug)]
#[command(name = "asa-ledger")]
#[command(about = "Reconcile assessment exports into course ledgers")]
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
    /// Create an empty ledger for a course
    Create {
        #[arg(value_enum)]
        ledger: Ledger,

        /// Course code (must be listed in Course_codes.txt)
        #[arg(short, long)]
        course: String,
    },

    /// Merge an assessment export into a ledger
    Update {
        #[arg(value_enum)]
        ledger: Ledger,

        /// Course code (must be listed in Course_codes.txt)
        #[arg(short, long)]
        course: String,

        /// Assessment export CSV
        #[arg(short, long)]
        delta: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Ledger {
    Completions,
    Results,
}

impl From<Ledger> for LedgerKind {
    fn from(ledger: Ledger) -> Self {
        match ledger {
            Ledger::Completions => LedgerKind::Completions,
            Ledger::Results => LedgerKind::Results,
        }
    }
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref(), args.data_dir.as_deref())
        .context("Failed to load configuration")?;

    init_tracing(&settings.config.logging.level);
    info!(
        "Starting ASA Ledger (asa-ledger) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Data folder: {}", settings.data_dir.display());

    match args.command {
        Command::Create { ledger, course } => {
            let files = CourseFiles::open(&settings.data_dir, &course)
                .with_context(|| format!("Cannot open course {}", course))?;
            let path = create_ledger(&files, ledger.into())
                .with_context(|| format!("Failed to create {:?} ledger", ledger))?;
            info!("Created {}", path.display());
        }
        Command::Update {
            ledger,
            course,
            delta,
        } => {
            let files = CourseFiles::open(&settings.data_dir, &course)
                .with_context(|| format!("Cannot open course {}", course))?;
            let kind = LedgerKind::from(ledger);
            let outcome = UpdateCycle::new(&files, &settings.config.update)
                .run(kind, &delta)
                .with_context(|| format!("Update of {} ledger for {} failed", kind, course))?;

            info!("Saved {}", outcome.snapshot.display());
            if let Some(path) = &outcome.unresolved_list {
                info!(
                    "Unknown students saved to {}; add them to the enrolment file or update the ledger manually",
                    path.display()
                );
            }
            if let Some(path) = &outcome.duplicates_list {
                info!(
                    "Duplicate-name submissions saved to {}; process these manually",
                    path.display()
                );
            }
            outcome.diagnostics.log_summary("update");
        }
    }

    Ok(())
}
