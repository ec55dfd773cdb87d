//! Zero-completion extraction
//!
//! Finds students in the assessment-download roster who are not yet in the
//! completion ledger and have nothing recorded in the roster either.

use asa_common::{Diagnostics, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

const STAGE: &str = "zero";

/// Leading roster columns copied to the output
pub const ROSTER_HEADINGS: [&str; 5] = [
    "EnrolmentPK",
    "StudentPK",
    "NameGiven",
    "NameSurname",
    "CoursePK",
];

/// Load the roster rows (header skipped)
pub fn load_roster(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    info!(path = %path.display(), students = rows.len(), "Loaded assessment roster");
    Ok(rows)
}

/// Roster students with zero completion
///
/// A student qualifies when their enrolment id (first column) is not in
/// `ledger_ids` and every column after the first five is blank. Returns the
/// first five columns of each qualifying row.
pub fn zero_students(
    roster: &[Vec<String>],
    ledger_ids: &HashSet<String>,
) -> (Vec<Vec<String>>, Diagnostics) {
    let width = ROSTER_HEADINGS.len();
    let mut diagnostics = Diagnostics::new();
    let mut students = Vec::new();

    for (line, row) in roster.iter().enumerate() {
        if row.len() < width {
            diagnostics.warn(
                STAGE,
                format!("roster row {} has {} columns, expected at least {}", line + 2, row.len(), width),
            );
            continue;
        }
        if ledger_ids.contains(row[0].trim()) {
            continue;
        }
        if row[width..].iter().any(|cell| !cell.trim().is_empty()) {
            continue;
        }
        students.push(row[..width].to_vec());
    }

    info!(students = students.len(), "Found zero-completion students");
    (students, diagnostics)
}
