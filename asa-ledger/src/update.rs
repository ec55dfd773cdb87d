//! Ledger update cycle
//!
//! One cycle reconciles one assessment export into one course ledger:
//!
//! ```text
//! confirm files → load catalog/identities → resolve names → normalize
//!   → merge transfers → merge graded → write new snapshot → side lists
//! ```
//!
//! The snapshot and side lists are rendered in memory and committed as one
//! [`OutputSet`], so a failed cycle leaves the data folder unchanged.

use crate::cell::{CompletionCell, LedgerCell, ResultCell};
use crate::identity::{self, IdentityTable, Resolution, SubmissionRow};
use crate::merge::{self, Fact, MergeReport};
use crate::normalizer::{DeltaNormalizer, NormalizedBatch};
use crate::snapshot;
use crate::store::RecordStore;
use asa_common::config::UpdateConfig;
use asa_common::flatfile::{confirm_files, load_records, OutputSet};
use asa_common::time::file_stamp;
use asa_common::{AssessmentCatalog, CourseFiles, Diagnostics, Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Which ledger a command works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerKind {
    Completions,
    Results,
}

impl LedgerKind {
    /// Current ledger file for the course
    pub fn ledger_path(self, files: &CourseFiles) -> PathBuf {
        match self {
            Self::Completions => files.completion_ledger(),
            Self::Results => files.results_ledger(),
        }
    }

    /// Prefix of the snapshot written by an update
    pub fn snapshot_prefix(self, course: &str) -> String {
        match self {
            Self::Completions => format!("Master_Completion_{}", course),
            Self::Results => format!("Master_Results_{}", course),
        }
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completions => f.write_str("completions"),
            Self::Results => f.write_str("results"),
        }
    }
}

/// Files produced by a successful cycle
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub snapshot: PathBuf,
    pub unresolved_list: Option<PathBuf>,
    pub duplicates_list: Option<PathBuf>,
    pub reports: Vec<MergeReport>,
    pub diagnostics: Diagnostics,
}

/// Create a header-only ledger for the course
pub fn create_ledger(files: &CourseFiles, kind: LedgerKind) -> Result<PathBuf> {
    confirm_files(&[files.assessment_names()])?;
    let catalog = files.load_catalog()?;
    let path = kind.ledger_path(files);
    match kind {
        LedgerKind::Completions => snapshot::create_empty::<CompletionCell>(&path, &catalog)?,
        LedgerKind::Results => snapshot::create_empty::<ResultCell>(&path, &catalog)?,
    }
    info!(course = files.course(), ledger = %kind, path = %path.display(), "Created ledger");
    Ok(path)
}

/// Inputs shared by both ledger kinds, after identity resolution and normalization
struct PreparedBatch {
    catalog: AssessmentCatalog,
    resolution: Resolution,
    batch: NormalizedBatch,
    diagnostics: Diagnostics,
}

/// Runs update cycles for one course
pub struct UpdateCycle<'a> {
    files: &'a CourseFiles,
    config: &'a UpdateConfig,
}

impl<'a> UpdateCycle<'a> {
    pub fn new(files: &'a CourseFiles, config: &'a UpdateConfig) -> Self {
        Self { files, config }
    }

    /// Every file the cycle reads
    pub fn required_files(&self, kind: LedgerKind, delta: &Path) -> Vec<PathBuf> {
        vec![
            delta.to_path_buf(),
            self.files.assessment_names(),
            self.files.passing_scores(),
            self.files.enrolment_ids(),
            self.files.duplicate_names(),
            kind.ledger_path(self.files),
        ]
    }

    /// Reconcile the export at `delta` into the `kind` ledger
    pub fn run(&self, kind: LedgerKind, delta: &Path) -> Result<UpdateOutcome> {
        self.run_at(kind, delta, &file_stamp())
    }

    /// As [`run`](Self::run), naming every output with `stamp`
    pub fn run_at(&self, kind: LedgerKind, delta: &Path, stamp: &str) -> Result<UpdateOutcome> {
        confirm_files(&self.required_files(kind, delta))?;
        info!(course = self.files.course(), ledger = %kind, delta = %delta.display(), "Starting update");

        let prepared = self.prepare(delta)?;
        let ledger_path = kind.ledger_path(self.files);
        let snapshot_path =
            self.files
                .output_at(&kind.snapshot_prefix(self.files.course()), stamp, "csv");
        let mut outputs = OutputSet::new();

        let (reports, merge_diagnostics) = match kind {
            LedgerKind::Completions => {
                let transfers: Vec<Fact<CompletionCell>> =
                    prepared.batch.transfers.iter().map(|f| f.completion()).collect();
                let graded: Vec<Fact<CompletionCell>> =
                    prepared.batch.graded.iter().map(|f| f.completion()).collect();
                let (store, reports, diagnostics) =
                    reconcile(&ledger_path, &prepared.catalog, &[transfers, graded])?;
                snapshot::stage(&mut outputs, snapshot_path.clone(), &store, &prepared.catalog)?;
                (reports, diagnostics)
            }
            LedgerKind::Results => {
                let label = &self.config.results_grade_label;
                let graded: Vec<Fact<ResultCell>> = prepared
                    .batch
                    .graded
                    .iter()
                    .filter_map(|f| f.result(label))
                    .collect();
                if graded.is_empty() {
                    return Err(Error::EmptyDelta(
                        "no passing submissions for the results ledger".to_string(),
                    ));
                }
                let (store, reports, diagnostics) =
                    reconcile(&ledger_path, &prepared.catalog, &[graded])?;
                snapshot::stage(&mut outputs, snapshot_path.clone(), &store, &prepared.catalog)?;
                (reports, diagnostics)
            }
        };

        let mut diagnostics = prepared.diagnostics;
        diagnostics.merge(merge_diagnostics);

        let unresolved_list = self.stage_unresolved(&mut outputs, &prepared.resolution.unresolved, stamp);
        let duplicates_list =
            self.stage_duplicates(&mut outputs, &prepared.resolution.duplicate_rows, stamp);
        outputs.commit()?;

        info!(path = %snapshot_path.display(), "Saved ledger snapshot");
        if let Some(path) = &unresolved_list {
            info!(path = %path.display(), names = prepared.resolution.unresolved.len(), "Saved unknown students for manual processing");
        }
        if let Some(path) = &duplicates_list {
            info!(path = %path.display(), rows = prepared.resolution.duplicate_rows.len(), "Saved duplicate-name submissions");
        }

        Ok(UpdateOutcome {
            snapshot: snapshot_path,
            unresolved_list,
            duplicates_list,
            reports,
            diagnostics,
        })
    }

    fn prepare(&self, delta: &Path) -> Result<PreparedBatch> {
        let catalog = self.files.load_catalog()?;
        let scores = self.files.load_passing_scores(&catalog)?;
        let table = IdentityTable::new(self.files.load_identities()?);
        let duplicates = self.files.load_duplicate_names()?;

        let rows: Vec<SubmissionRow> = load_records(delta)?;
        if rows.is_empty() {
            return Err(Error::EmptyDelta(format!("{} has no rows", delta.display())));
        }

        let (resolution, mut diagnostics) = identity::resolve(rows, &table, &duplicates);
        if resolution.resolved.is_empty() {
            return Err(Error::EmptyDelta(
                "no submission rows matched an enrolled student".to_string(),
            ));
        }

        let normalizer = DeltaNormalizer::new(self.config, &catalog, &scores);
        let (batch, normalize_diagnostics) = normalizer.normalize_batch(&resolution.resolved)?;
        diagnostics.merge(normalize_diagnostics);
        if batch.is_empty() {
            return Err(Error::EmptyDelta(
                "no transfers or passing submissions to record".to_string(),
            ));
        }

        info!(
            transfers = batch.transfers.len(),
            graded = batch.graded.len(),
            "Prepared facts"
        );
        Ok(PreparedBatch {
            catalog,
            resolution,
            batch,
            diagnostics,
        })
    }

    fn stage_unresolved(
        &self,
        outputs: &mut OutputSet,
        names: &[String],
        stamp: &str,
    ) -> Option<PathBuf> {
        if names.is_empty() {
            return None;
        }
        let path = self.files.output_at(
            &format!("Unknown_students_{}", self.files.course()),
            stamp,
            "txt",
        );
        outputs.add_lines(path.clone(), names);
        Some(path)
    }

    fn stage_duplicates(
        &self,
        outputs: &mut OutputSet,
        rows: &[SubmissionRow],
        stamp: &str,
    ) -> Option<PathBuf> {
        if rows.is_empty() {
            return None;
        }
        let path = self.files.output_at(
            &format!("{}_Duplicate_Name_Assessments", self.files.course()),
            stamp,
            "txt",
        );
        let lines: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        outputs.add_lines(path.clone(), &lines);
        Some(path)
    }
}

/// Load the ledger and merge each fact set in order
fn reconcile<C: LedgerCell>(
    ledger_path: &Path,
    catalog: &AssessmentCatalog,
    fact_sets: &[Vec<Fact<C>>],
) -> Result<(RecordStore<C>, Vec<MergeReport>, Diagnostics)> {
    let mut store = snapshot::read::<C>(ledger_path, catalog)?;
    let mut reports = Vec::with_capacity(fact_sets.len());
    let mut diagnostics = Diagnostics::new();

    for facts in fact_sets {
        let (report, merge_diagnostics) = merge::apply(&mut store, facts, catalog)?;
        reports.push(report);
        diagnostics.merge(merge_diagnostics);
    }
    Ok((store, reports, diagnostics))
}
