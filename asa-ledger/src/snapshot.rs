//! Ledger snapshot files
//!
//! Layout: `EnrolmentID,StudentID,Name,Course` followed by the assessment
//! columns in catalog order (`LedgerCell::WIDTH` columns per assessment).
//! Snapshots are only ever written to new files.

use crate::cell::LedgerCell;
use crate::store::{RecordStore, StudentRecord};
use asa_common::flatfile::{self, OutputSet};
use asa_common::{AssessmentCatalog, EnrolmentIdentity, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Identifying columns that precede the assessment cells
pub const IDENTITY_HEADINGS: [&str; 4] = ["EnrolmentID", "StudentID", "Name", "Course"];

/// Full header row for a ledger over `catalog`
pub fn headings<C: LedgerCell>(catalog: &AssessmentCatalog) -> Vec<String> {
    IDENTITY_HEADINGS
        .iter()
        .map(|h| h.to_string())
        .chain(catalog.names().iter().flat_map(|name| C::headings(name)))
        .collect()
}

/// Load a ledger, validating its header and every cell
pub fn read<C: LedgerCell>(path: &Path, catalog: &AssessmentCatalog) -> Result<RecordStore<C>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let expected = headings::<C>(catalog);
    let found: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if found != expected {
        let first_difference = expected
            .iter()
            .zip(found.iter())
            .position(|(e, f)| e != f)
            .unwrap_or_else(|| expected.len().min(found.len()));
        return Err(Error::Ledger(format!(
            "{}: header does not match the assessment catalog (column {}: expected '{}', found '{}')",
            path.display(),
            first_difference + 1,
            expected.get(first_difference).map(String::as_str).unwrap_or(""),
            found.get(first_difference).map(String::as_str).unwrap_or("")
        )));
    }

    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let fields: Vec<&str> = record.iter().collect();
        records.push(parse_record::<C>(&fields, expected.len()).map_err(|e| match e {
            Error::Ledger(msg) => Error::Ledger(format!("{} row {}: {}", path.display(), line + 2, msg)),
            other => other,
        })?);
    }

    let store = RecordStore::from_records(catalog.len(), records)?;
    info!(path = %path.display(), students = store.len(), "Loaded ledger");
    Ok(store)
}

fn parse_record<C: LedgerCell>(fields: &[&str], width: usize) -> Result<StudentRecord<C>> {
    if fields.len() != width {
        return Err(Error::Ledger(format!(
            "{} columns, expected {}",
            fields.len(),
            width
        )));
    }

    let (ids, cells) = fields.split_at(IDENTITY_HEADINGS.len());
    let enrollment_id = ids[0].trim();
    if enrollment_id.is_empty() {
        return Err(Error::Ledger("blank enrolment id".to_string()));
    }

    let identity = EnrolmentIdentity {
        enrollment_id: enrollment_id.to_string(),
        student_id: ids[1].trim().to_string(),
        name: ids[2].trim().to_string(),
        course: ids[3].trim().to_string(),
    };
    let cells = cells
        .chunks(C::WIDTH)
        .map(C::parse)
        .collect::<Result<Vec<C>>>()?;

    Ok(StudentRecord::with_cells(identity, cells))
}

/// Render one record to CSV fields
pub fn render_record<C: LedgerCell>(record: &StudentRecord<C>) -> Vec<String> {
    let identity = &record.identity;
    [
        identity.enrollment_id.clone(),
        identity.student_id.clone(),
        identity.name.clone(),
        identity.course.clone(),
    ]
    .into_iter()
    .chain(record.cells().iter().flat_map(|cell| cell.render()))
    .collect()
}

/// Queue a snapshot of `store` at `path` in `outputs`
pub fn stage<C: LedgerCell>(
    outputs: &mut OutputSet,
    path: PathBuf,
    store: &RecordStore<C>,
    catalog: &AssessmentCatalog,
) -> Result<()> {
    store.check_schema()?;
    outputs.add_table(path, &headings::<C>(catalog), store.iter().map(render_record))?;
    debug!(students = store.len(), "Rendered ledger snapshot");
    Ok(())
}

/// Write a header-only ledger, refusing to replace an existing file
pub fn create_empty<C: LedgerCell>(path: &Path, catalog: &AssessmentCatalog) -> Result<()> {
    flatfile::write_table(path, &headings::<C>(catalog), Vec::<Vec<String>>::new())?;
    debug!(path = %path.display(), "Created empty ledger");
    Ok(())
}
