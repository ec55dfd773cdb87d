//! # ASA Analysis
//!
//! Completion analysis over the course ledgers.
//!
//! - [`resolver`]: per-student module completion status
//! - [`stats`]: completion counts and percentages
//! - [`table`]: ledger rows joined with demographics
//! - [`filter`]: row filters
//! - [`pipeline`]: trial/commit filter pipeline
//! - [`prompt`]: interactive filter menu
//! - [`report`]: analysis output tables
//! - [`module_report`]: single-module analysis
//! - [`zero_completion`]: students with nothing recorded yet
//! - [`commands`]: end-to-end commands

pub mod commands;
pub mod filter;
pub mod module_report;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod resolver;
pub mod stats;
pub mod table;
pub mod zero_completion;

pub use filter::{FilterGroup, RowFilter};
pub use pipeline::{FilterDriver, FilterList, FilterPipeline, Filtered, TrialOutcome};
pub use resolver::{ModuleResolver, ModuleStatus};
pub use table::{AnalysisRow, Demographics, Table};
