//! Submission rows and name → enrolment resolution
//!
//! The assessment export identifies students by display name only. Names are
//! matched against the course identity table; rows for names shared by more
//! than one student, or for names not in the table, are set aside for manual
//! processing and never reach the merge.

use asa_common::{Diagnostics, EnrolmentIdentity};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

const STAGE: &str = "identity";

/// One row of the assessment export
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmissionRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Date and time")]
    pub timestamp: String,
    #[serde(rename = "Grade item")]
    pub grade_item: String,
    #[serde(rename = "Revised grade", default)]
    pub revised_grade: String,
    #[serde(rename = "Feedback text", default)]
    pub feedback: String,
}

impl fmt::Display for SubmissionRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.name, self.timestamp, self.grade_item, self.revised_grade, self.feedback
        )
    }
}

/// A submission row with the student's enrolment attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSubmission {
    pub identity: EnrolmentIdentity,
    pub row: SubmissionRow,
}

/// Name → enrolment lookup for one course
#[derive(Debug, Clone, Default)]
pub struct IdentityTable {
    by_name: HashMap<String, EnrolmentIdentity>,
}

impl IdentityTable {
    /// Index identities by name; the first entry for a name wins
    pub fn new(identities: Vec<EnrolmentIdentity>) -> Self {
        let mut by_name = HashMap::with_capacity(identities.len());
        for identity in identities {
            by_name
                .entry(identity.name.trim().to_string())
                .or_insert(identity);
        }
        Self { by_name }
    }

    pub fn lookup(&self, name: &str) -> Option<&EnrolmentIdentity> {
        self.by_name.get(name.trim())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Outcome of resolving one export
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Rows ready for normalization, in export order
    pub resolved: Vec<ResolvedSubmission>,
    /// Rows removed because the name is shared by several students
    pub duplicate_rows: Vec<SubmissionRow>,
    /// Names with no enrolment, sorted and deduplicated
    pub unresolved: Vec<String>,
}

/// Remove duplicate-name rows, then attach enrolments to the rest
pub fn resolve(
    rows: Vec<SubmissionRow>,
    table: &IdentityTable,
    duplicate_names: &HashSet<String>,
) -> (Resolution, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let mut resolution = Resolution::default();
    let mut unresolved = BTreeSet::new();
    let mut duplicated = BTreeSet::new();

    for row in rows {
        let name = row.name.trim();
        if duplicate_names.contains(name) {
            duplicated.insert(name.to_string());
            resolution.duplicate_rows.push(row);
            continue;
        }

        match table.lookup(name) {
            Some(identity) => resolution.resolved.push(ResolvedSubmission {
                identity: identity.clone(),
                row,
            }),
            None => {
                unresolved.insert(name.to_string());
            }
        }
    }

    for name in &duplicated {
        warn!(name = %name, "Shared student name, rows set aside for manual processing");
        diagnostics.warn(STAGE, format!("duplicate name set aside: {}", name));
    }
    for name in &unresolved {
        warn!(name = %name, "No enrolment found for student name");
        diagnostics.warn(STAGE, format!("unknown student: {}", name));
    }

    resolution.unresolved = unresolved.into_iter().collect();
    debug!(
        resolved = resolution.resolved.len(),
        duplicates = resolution.duplicate_rows.len(),
        unresolved = resolution.unresolved.len(),
        "Identity resolution complete"
    );
    (resolution, diagnostics)
}
