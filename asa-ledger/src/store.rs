//! Student records and the record store
//!
//! The store owns every [`StudentRecord`] of one ledger. Records keep file
//! order (new students are appended) and are indexed by enrollment id.
//!
//! **Invariants:**
//! - every record holds exactly one cell per catalogued assessment
//! - an enrollment id identifies at most one record

use crate::cell::LedgerCell;
use asa_common::{Error, EnrolmentIdentity, Result};
use std::collections::HashMap;

/// One student's row in a ledger
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord<C> {
    pub identity: EnrolmentIdentity,
    cells: Vec<C>,
}

impl<C: LedgerCell> StudentRecord<C> {
    /// A record with every cell unfilled
    pub fn blank(identity: EnrolmentIdentity, cell_count: usize) -> Self {
        Self {
            identity,
            cells: vec![C::empty(); cell_count],
        }
    }

    /// A record with existing cells
    pub fn with_cells(identity: EnrolmentIdentity, cells: Vec<C>) -> Self {
        Self { identity, cells }
    }

    pub fn enrollment_id(&self) -> &str {
        &self.identity.enrollment_id
    }

    pub fn cells(&self) -> &[C] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&C> {
        self.cells.get(index)
    }

    pub(crate) fn cell_mut(&mut self, index: usize) -> Option<&mut C> {
        self.cells.get_mut(index)
    }

    /// Number of filled cells
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }
}

/// Ordered, enrollment-id-indexed collection of student records
#[derive(Debug, Clone)]
pub struct RecordStore<C> {
    cell_count: usize,
    records: Vec<StudentRecord<C>>,
    index: HashMap<String, usize>,
}

impl<C: LedgerCell> RecordStore<C> {
    /// An empty store whose records hold `cell_count` cells
    pub fn new(cell_count: usize) -> Self {
        Self {
            cell_count,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build from existing records, enforcing both invariants
    pub fn from_records(cell_count: usize, records: Vec<StudentRecord<C>>) -> Result<Self> {
        let mut store = Self::new(cell_count);
        for record in records {
            store.push(record)?;
        }
        Ok(store)
    }

    fn push(&mut self, record: StudentRecord<C>) -> Result<usize> {
        if record.cells.len() != self.cell_count {
            return Err(Error::Ledger(format!(
                "record {} has {} cells, expected {}",
                record.enrollment_id(),
                record.cells.len(),
                self.cell_count
            )));
        }
        if self.index.contains_key(record.enrollment_id()) {
            return Err(Error::Ledger(format!(
                "enrolment {} appears more than once",
                record.enrollment_id()
            )));
        }

        let position = self.records.len();
        self.index.insert(record.enrollment_id().to_string(), position);
        self.records.push(record);
        Ok(position)
    }

    /// Append a blank record for `identity`, returning its position
    pub fn insert_blank(&mut self, identity: EnrolmentIdentity) -> Result<usize> {
        let record = StudentRecord::blank(identity, self.cell_count);
        self.push(record)
    }

    pub fn position(&self, enrollment_id: &str) -> Option<usize> {
        self.index.get(enrollment_id).copied()
    }

    pub fn get(&self, enrollment_id: &str) -> Option<&StudentRecord<C>> {
        self.position(enrollment_id).map(|p| &self.records[p])
    }

    pub(crate) fn record_mut(&mut self, position: usize) -> Option<&mut StudentRecord<C>> {
        self.records.get_mut(position)
    }

    pub fn contains(&self, enrollment_id: &str) -> bool {
        self.index.contains_key(enrollment_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StudentRecord<C>> {
        self.records.iter()
    }

    pub fn records(&self) -> &[StudentRecord<C>] {
        &self.records
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Re-check the cell-count invariant over every record
    pub fn check_schema(&self) -> Result<()> {
        match self.records.iter().find(|r| r.cells.len() != self.cell_count) {
            Some(record) => Err(Error::Ledger(format!(
                "record {} has {} cells, expected {}",
                record.enrollment_id(),
                record.cells.len(),
                self.cell_count
            ))),
            None => Ok(()),
        }
    }
}
