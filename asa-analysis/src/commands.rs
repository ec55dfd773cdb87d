//! Analysis commands
//!
//! Each command confirms its inputs, loads everything, renders every output
//! table and only then commits them together. A failure or a quit at a
//! prompt leaves the data folder unchanged.

use crate::filter::RowFilter;
use crate::module_report::{analyse_module, StudentInfo};
use crate::pipeline::{FilterDriver, FilterPipeline};
use crate::report::{base_headings, results_rows, CompletionReport};
use crate::resolver::ModuleResolver;
use crate::table::{project, DemographicSources};
use crate::zero_completion::{load_roster, zero_students, ROSTER_HEADINGS};
use asa_common::config::AnalysisConfig;
use asa_common::flatfile::{confirm_files, load_records, write_table, OutputSet};
use asa_common::time::file_stamp;
use asa_common::{CourseFiles, Diagnostics, Error, Result};
use asa_ledger::{snapshot, CompletionCell, ResultCell};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Files written by `analyse`
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub completion: PathBuf,
    pub results: PathBuf,
    pub filters: Vec<RowFilter>,
    pub students: usize,
    pub diagnostics: Diagnostics,
}

/// Every file `analyse` reads
pub fn analysis_inputs(files: &CourseFiles) -> Vec<PathBuf> {
    vec![
        files.assessment_names(),
        files.modules(),
        files.month_order(),
        files.completion_ledger(),
        files.results_ledger(),
        files.enrolment_data(),
        files.student_data(),
        files.graduation_dates(),
        files.pacific_nations(),
    ]
}

/// Project both ledgers, filter them, and write the analysis tables
pub fn run_analysis<D: FilterDriver>(
    files: &CourseFiles,
    config: &AnalysisConfig,
    today: NaiveDate,
    driver: &mut D,
) -> Result<AnalysisOutcome> {
    confirm_files(&analysis_inputs(files))?;
    info!(course = files.course(), "Starting analysis");

    let catalog = files.load_catalog()?;
    let modules = files.load_modules(&catalog)?;
    let order = files.load_month_order()?;
    let completions = snapshot::read::<CompletionCell>(&files.completion_ledger(), &catalog)?;
    let results = snapshot::read::<ResultCell>(&files.results_ledger(), &catalog)?;
    let sources = DemographicSources::load(files)?;

    let (completion_table, mut diagnostics) = project(&completions, &sources, today);
    let (results_table, results_diagnostics) = project(&results, &sources, today);
    diagnostics.merge(results_diagnostics);

    let filtered = FilterPipeline::new(completion_table, results_table).run(driver)?;
    diagnostics.merge(filtered.diagnostics);

    let resolver = ModuleResolver::new(&catalog, &order, config.keep_transfers);
    let report = CompletionReport::new(&catalog, &modules, resolver);
    let completion_rows = report.rows(&filtered.completion)?;

    let stamp = file_stamp();
    let completion_path = files.output_at(&format!("Analysis_{}", files.course()), &stamp, "csv");
    let results_path =
        files.output_at(&format!("Analysis_Results_{}", files.course()), &stamp, "csv");
    let mut outputs = OutputSet::new();
    outputs.add_table(completion_path.clone(), &report.headings(), completion_rows)?;
    outputs.add_table(
        results_path.clone(),
        &base_headings::<ResultCell>(&catalog),
        results_rows(&filtered.results),
    )?;
    outputs.commit()?;

    info!(
        students = filtered.completion.len(),
        filters = filtered.filters.len(),
        path = %completion_path.display(),
        "Saved analysis"
    );
    Ok(AnalysisOutcome {
        completion: completion_path,
        results: results_path,
        filters: filtered.filters,
        students: filtered.completion.len(),
        diagnostics,
    })
}

/// Analyse one module; returns the counts and students file paths
pub fn run_module_analysis(files: &CourseFiles, module_name: &str) -> Result<(PathBuf, PathBuf)> {
    confirm_files(&[
        files.assessment_names(),
        files.modules(),
        files.month_order(),
        files.completion_ledger(),
        files.student_info(),
    ])?;

    let catalog = files.load_catalog()?;
    let modules = files.load_modules(&catalog)?;
    let module = modules.get(module_name.trim()).ok_or_else(|| {
        Error::InvalidInput(format!(
            "module '{}' is not defined for {}; available: {}",
            module_name.trim(),
            files.course(),
            modules.names().join(", ")
        ))
    })?;
    let order = files.load_month_order()?;
    let store = snapshot::read::<CompletionCell>(&files.completion_ledger(), &catalog)?;
    let student_info: Vec<StudentInfo> = load_records(&files.student_info())?;

    analyse_module(&store, module, &catalog, &order, &student_info)?.write(files)
}

/// Files written by `zero`
#[derive(Debug, Clone)]
pub struct ZeroOutcome {
    pub path: PathBuf,
    pub students: usize,
    pub diagnostics: Diagnostics,
}

/// Extract zero-completion students from `roster` (default: the course's
/// assessment-download file)
pub fn run_zero_extraction(files: &CourseFiles, roster: Option<&Path>) -> Result<ZeroOutcome> {
    let roster_path = roster
        .map(Path::to_path_buf)
        .unwrap_or_else(|| files.assessment_downloads());
    confirm_files(&[
        roster_path.clone(),
        files.assessment_names(),
        files.completion_ledger(),
    ])?;

    let catalog = files.load_catalog()?;
    let store = snapshot::read::<CompletionCell>(&files.completion_ledger(), &catalog)?;
    let ledger_ids: HashSet<String> = store
        .iter()
        .map(|record| record.enrollment_id().to_string())
        .collect();
    let roster_rows = load_roster(&roster_path)?;

    let (students, diagnostics) = zero_students(&roster_rows, &ledger_ids);
    let path = files.output(&format!("Zero_students_{}", files.course()), "csv");
    let count = students.len();
    write_table(&path, &ROSTER_HEADINGS, students)?;
    info!(path = %path.display(), students = count, "Saved zero-completion students");

    Ok(ZeroOutcome {
        path,
        students: count,
        diagnostics,
    })
}
