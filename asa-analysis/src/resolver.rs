//! Completion Status Resolver
//!
//! Derives one module's status for one student from the completion ledger.
//!
//! **Algorithm:**
//! 1. Any required cell `Empty` ⇒ `Incomplete` (short-circuit)
//! 2. Collect the distinct filled values of the required cells
//! 3. Transfers not kept and any `Transferred` present ⇒ `Transferred`
//! 4. Drop `Transferred`; nothing left ⇒ `Transferred`
//! 5. One distinct month ⇒ that month
//! 6. Otherwise the latest month according to the month order

use asa_common::{
    AssessmentCatalog, Error, ModuleCatalog, ModuleDefinition, MonthOrder, MonthToken, Resolve,
    Result,
};
use asa_ledger::cell::TRANSFERRED;
use asa_ledger::{CompletionCell, StudentRecord};
use std::fmt;

/// Completion status of one module for one student
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ModuleStatus {
    #[default]
    Incomplete,
    Transferred,
    CompletedMonth(MonthToken),
}

impl ModuleStatus {
    /// Transferred or completed
    pub fn is_complete(&self) -> bool {
        !matches!(self, Self::Incomplete)
    }

    pub fn month(&self) -> Option<&MonthToken> {
        match self {
            Self::CompletedMonth(token) => Some(token),
            _ => None,
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete => Ok(()),
            Self::Transferred => f.write_str(TRANSFERRED),
            Self::CompletedMonth(token) => write!(f, "{}", token),
        }
    }
}

/// Resolves module statuses against one catalog and month order
#[derive(Debug, Clone, Copy)]
pub struct ModuleResolver<'a> {
    catalog: &'a AssessmentCatalog,
    order: &'a MonthOrder,
    keep_transfers: bool,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(catalog: &'a AssessmentCatalog, order: &'a MonthOrder, keep_transfers: bool) -> Self {
        Self {
            catalog,
            order,
            keep_transfers,
        }
    }

    pub fn keep_transfers(&self) -> bool {
        self.keep_transfers
    }

    /// Status of `module` for the student in `record`
    ///
    /// Fails if a required assessment has no cell in the record, or if two
    /// or more distinct months must be ordered and one of them is not in the
    /// month order.
    pub fn resolve(
        &self,
        record: &StudentRecord<CompletionCell>,
        module: &ModuleDefinition,
    ) -> Result<ModuleStatus> {
        let mut months: Vec<&MonthToken> = Vec::new();
        let mut transferred = false;

        for assessment in &module.assessments {
            let index = self.catalog.require(assessment, record.enrollment_id())?;
            let cell = record.cell(index).ok_or_else(|| {
                Error::Ledger(format!(
                    "enrolment {} has no cell for '{}'",
                    record.enrollment_id(),
                    assessment
                ))
            })?;
            match cell {
                CompletionCell::Empty => return Ok(ModuleStatus::Incomplete),
                CompletionCell::Transferred => transferred = true,
                CompletionCell::Month(token) => {
                    if !months.contains(&token) {
                        months.push(token);
                    }
                }
            }
        }

        if transferred && !self.keep_transfers {
            return Ok(ModuleStatus::Transferred);
        }
        match months.as_slice() {
            [] => Ok(ModuleStatus::Transferred),
            [only] => Ok(ModuleStatus::CompletedMonth((*only).clone())),
            _ => self
                .order
                .resolve(months.iter().copied(), Resolve::Latest)
                .map(ModuleStatus::CompletedMonth),
        }
    }

    /// Statuses of every module, in catalog order
    pub fn resolve_all(
        &self,
        record: &StudentRecord<CompletionCell>,
        modules: &ModuleCatalog,
    ) -> Result<Vec<ModuleStatus>> {
        modules
            .iter()
            .map(|module| self.resolve(record, module))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asa_common::EnrolmentIdentity;

    fn catalog() -> AssessmentCatalog {
        AssessmentCatalog::new(["A", "B", "C"]).unwrap()
    }

    fn order() -> MonthOrder {
        MonthOrder::new(["Nov-18", "Dec-18", "Jan-19", "Feb-19", "Mar-19"]).unwrap()
    }

    fn module(assessments: &[&str]) -> ModuleDefinition {
        ModuleDefinition::new("Module 1", assessments.iter().map(|a| a.to_string()).collect())
    }

    fn record(cells: Vec<CompletionCell>) -> StudentRecord<CompletionCell> {
        StudentRecord::with_cells(
            EnrolmentIdentity {
                enrollment_id: "E1".to_string(),
                student_id: "S1".to_string(),
                name: "Ana Smith".to_string(),
                course: "ABC".to_string(),
            },
            cells,
        )
    }

    fn month(token: &str) -> CompletionCell {
        CompletionCell::Month(MonthToken::parse(token).unwrap())
    }

    fn completed(token: &str) -> ModuleStatus {
        ModuleStatus::CompletedMonth(MonthToken::parse(token).unwrap())
    }

    #[test]
    fn test_empty_required_cell_is_incomplete() {
        let (catalog, order) = (catalog(), order());
        let student = record(vec![CompletionCell::Empty, month("Feb-19"), CompletionCell::Empty]);
        for keep in [true, false] {
            let resolver = ModuleResolver::new(&catalog, &order, keep);
            assert_eq!(
                resolver.resolve(&student, &module(&["A", "B"])).unwrap(),
                ModuleStatus::Incomplete
            );
        }
    }

    #[test]
    fn test_kept_transfer_collapses_to_remaining_month() {
        let (catalog, order) = (catalog(), order());
        let student = record(vec![month("Jan-19"), CompletionCell::Transferred, CompletionCell::Empty]);
        let resolver = ModuleResolver::new(&catalog, &order, true);
        assert_eq!(
            resolver.resolve(&student, &module(&["A", "B"])).unwrap(),
            completed("Jan-19")
        );
    }

    #[test]
    fn test_unkept_transfer_taints_module() {
        let (catalog, order) = (catalog(), order());
        let student = record(vec![month("Jan-19"), CompletionCell::Transferred, CompletionCell::Empty]);
        let resolver = ModuleResolver::new(&catalog, &order, false);
        assert_eq!(
            resolver.resolve(&student, &module(&["A", "B"])).unwrap(),
            ModuleStatus::Transferred
        );
    }

    #[test]
    fn test_all_transferred_regardless_of_keep() {
        let (catalog, order) = (catalog(), order());
        let student = record(vec![
            CompletionCell::Transferred,
            CompletionCell::Transferred,
            CompletionCell::Empty,
        ]);
        for keep in [true, false] {
            let resolver = ModuleResolver::new(&catalog, &order, keep);
            assert_eq!(
                resolver.resolve(&student, &module(&["A", "B"])).unwrap(),
                ModuleStatus::Transferred
            );
        }
    }

    #[test]
    fn test_latest_month_wins() {
        let (catalog, order) = (catalog(), order());
        // Lexical order would pick Nov-18
        let student = record(vec![month("Mar-19"), month("Nov-18"), month("Jan-19")]);
        let resolver = ModuleResolver::new(&catalog, &order, true);
        assert_eq!(
            resolver.resolve(&student, &module(&["A", "B", "C"])).unwrap(),
            completed("Mar-19")
        );
        assert_eq!(
            resolver.resolve(&student, &module(&["B", "C"])).unwrap(),
            completed("Jan-19")
        );
    }

    #[test]
    fn test_unknown_month_only_fatal_when_ordering_needed() {
        let (catalog, order) = (catalog(), order());
        let student = record(vec![month("Jun-17"), month("Jun-17"), month("Jan-19")]);
        let resolver = ModuleResolver::new(&catalog, &order, true);
        assert_eq!(
            resolver.resolve(&student, &module(&["A", "B"])).unwrap(),
            completed("Jun-17")
        );
        assert!(matches!(
            resolver.resolve(&student, &module(&["A", "C"])),
            Err(Error::UnknownMonth(_))
        ));
    }

    #[test]
    fn test_resolve_all_and_rendering() {
        let catalog = catalog();
        let order = order();
        let modules = ModuleCatalog::new(
            vec![
                ModuleDefinition::new("M1", vec!["A".to_string()]),
                ModuleDefinition::new("M2", vec!["B".to_string()]),
                ModuleDefinition::new("M3", vec!["C".to_string()]),
            ],
            &catalog,
        )
        .unwrap();
        let student = record(vec![month("Feb-19"), CompletionCell::Transferred, CompletionCell::Empty]);
        let statuses = ModuleResolver::new(&catalog, &order, true)
            .resolve_all(&student, &modules)
            .unwrap();
        let rendered: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        assert_eq!(rendered, vec!["Feb-19", "Transferred", ""]);
        assert!(statuses[1].is_complete());
        assert!(!statuses[2].is_complete());
    }
}
