//! Upsert merge engine
//!
//! Applies a batch of facts to a record store under a write-once policy.
//!
//! **Algorithm:**
//! 1. Resolve every fact's assessment to a cell index before touching the
//!    store; any uncatalogued assessment aborts the whole batch unmodified
//! 2. For each fact in input order, locate the student (existing or created
//!    earlier in this batch) or append a blank record
//! 3. Write the value only if the target cell is still empty
//!
//! Callers merge transfer facts before graded facts so that a transferred
//! cell is never back-filled with a grade.

use crate::cell::LedgerCell;
use crate::store::RecordStore;
use asa_common::{AssessmentCatalog, Diagnostics, EnrolmentIdentity, Error, Result};
use tracing::{debug, error, info};

const STAGE: &str = "merge";

/// One value destined for one student's assessment cell
#[derive(Debug, Clone, PartialEq)]
pub struct Fact<C> {
    pub identity: EnrolmentIdentity,
    pub assessment: String,
    pub value: C,
}

impl<C> Fact<C> {
    pub fn new(identity: EnrolmentIdentity, assessment: &str, value: C) -> Self {
        Self {
            identity,
            assessment: assessment.to_string(),
            value,
        }
    }
}

/// Counts from one merge run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Facts written into an empty cell
    pub written: usize,
    /// Facts ignored because the cell was already filled
    pub kept_existing: usize,
    /// Enrollment ids appended by this batch, in creation order
    pub created: Vec<String>,
}

/// Merge `facts` into `store`
///
/// On error the store is left exactly as it was.
pub fn apply<C: LedgerCell>(
    store: &mut RecordStore<C>,
    facts: &[Fact<C>],
    catalog: &AssessmentCatalog,
) -> Result<(MergeReport, Diagnostics)> {
    if store.cell_count() != catalog.len() {
        return Err(Error::Ledger(format!(
            "ledger has {} assessment cells but the catalog lists {}",
            store.cell_count(),
            catalog.len()
        )));
    }

    let indices = facts
        .iter()
        .map(|fact| catalog.require(&fact.assessment, &fact.identity.enrollment_id))
        .collect::<Result<Vec<usize>>>()
        .map_err(|e| {
            error!(error = %e, "Batch references an assessment outside the catalog");
            e
        })?;

    let mut report = MergeReport::default();
    let mut diagnostics = Diagnostics::new();

    for (fact, index) in facts.iter().zip(indices) {
        let enrollment_id = fact.identity.enrollment_id.as_str();

        let position = match store.position(enrollment_id) {
            Some(position) => position,
            None => {
                let position = store.insert_blank(fact.identity.clone())?;
                report.created.push(enrollment_id.to_string());
                debug!(enrollment_id, "Created ledger record");
                position
            }
        };

        let cell = store
            .record_mut(position)
            .and_then(|record| record.cell_mut(index))
            .ok_or_else(|| {
                Error::Ledger(format!(
                    "cell {} missing for enrolment {}",
                    index, enrollment_id
                ))
            })?;

        if cell.is_empty() {
            *cell = fact.value.clone();
            report.written += 1;
        } else {
            report.kept_existing += 1;
            debug!(
                enrollment_id,
                assessment = %fact.assessment,
                "Cell already filled, keeping existing value"
            );
            diagnostics.note(
                STAGE,
                format!(
                    "{} / {}: kept existing {:?}",
                    enrollment_id, fact.assessment, cell
                ),
            );
        }
    }

    store.check_schema()?;
    info!(
        written = report.written,
        kept_existing = report.kept_existing,
        created = report.created.len(),
        "Merged facts into ledger"
    );
    Ok((report, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CompletionCell;
    use asa_common::MonthToken;

    fn catalog() -> AssessmentCatalog {
        AssessmentCatalog::new(["A1", "A2", "A3"]).unwrap()
    }

    fn identity(id: &str) -> EnrolmentIdentity {
        EnrolmentIdentity {
            enrollment_id: id.to_string(),
            student_id: format!("S{}", id),
            name: format!("Student {}", id),
            course: "ABC".to_string(),
        }
    }

    fn month(token: &str) -> CompletionCell {
        CompletionCell::Month(MonthToken::parse(token).unwrap())
    }

    #[test]
    fn test_creates_missing_student_once() {
        let catalog = catalog();
        let mut store = RecordStore::new(catalog.len());
        let facts = vec![
            Fact::new(identity("E1"), "A1", month("Jan-19")),
            Fact::new(identity("E1"), "A3", month("Feb-19")),
        ];

        let (report, _) = apply(&mut store, &facts, &catalog).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(report.created, vec!["E1"]);
        assert_eq!(report.written, 2);

        let record = store.get("E1").unwrap();
        assert_eq!(record.cells(), &[month("Jan-19"), CompletionCell::Empty, month("Feb-19")]);
        assert_eq!(record.identity.name, "Student E1");
    }

    #[test]
    fn test_write_once_keeps_first_value() {
        let catalog = catalog();
        let mut store = RecordStore::new(catalog.len());
        let facts = vec![
            Fact::new(identity("E1"), "A1", month("Jan-19")),
            Fact::new(identity("E1"), "A1", month("Mar-19")),
            Fact::new(identity("E1"), "A1", CompletionCell::Transferred),
        ];

        let (report, diagnostics) = apply(&mut store, &facts, &catalog).unwrap();
        assert_eq!(store.get("E1").unwrap().cell(0), Some(&month("Jan-19")));
        assert_eq!(report.kept_existing, 2);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.warning_count(), 0);
    }

    #[test]
    fn test_unknown_assessment_leaves_store_untouched() {
        let catalog = catalog();
        let mut store = RecordStore::new(catalog.len());
        store.insert_blank(identity("E1")).unwrap();
        let facts = vec![
            Fact::new(identity("E1"), "A1", month("Jan-19")),
            Fact::new(identity("E2"), "A1", month("Jan-19")),
            Fact::new(identity("E1"), "Z9", month("Jan-19")),
        ];

        assert!(matches!(
            apply(&mut store, &facts, &catalog),
            Err(Error::UnknownAssessment { .. })
        ));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("E1").unwrap().filled(), 0);
    }

    #[test]
    fn test_mismatched_store_width_rejected() {
        let catalog = catalog();
        let mut store: RecordStore<CompletionCell> = RecordStore::new(2);
        assert!(matches!(
            apply(&mut store, &[], &catalog),
            Err(Error::Ledger(_))
        ));
    }
}
