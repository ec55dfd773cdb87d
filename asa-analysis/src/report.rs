//! Analysis output tables
//!
//! Completion analysis: ledger columns, demographic columns, one column per
//! module, then `Completed_Assessments`, `Completed_Modules` and
//! `Completion_Percent`. Results analysis: ledger columns and demographic
//! columns.

use crate::resolver::ModuleResolver;
use crate::stats::{completed_assessments, completed_modules, completion_percent};
use crate::table::{AnalysisRow, Table, DEMOGRAPHIC_HEADINGS};
use asa_common::{AssessmentCatalog, ModuleCatalog, Result};
use asa_ledger::snapshot::{self, render_record};
use asa_ledger::{CompletionCell, LedgerCell};

/// Summary columns closing each completion analysis row
pub const SUMMARY_HEADINGS: [&str; 3] = [
    "Completed_Assessments",
    "Completed_Modules",
    "Completion_Percent",
];

/// Ledger and demographic headings for a `C` ledger
pub fn base_headings<C: LedgerCell>(catalog: &AssessmentCatalog) -> Vec<String> {
    let mut headings = snapshot::headings::<C>(catalog);
    headings.extend(DEMOGRAPHIC_HEADINGS.iter().map(|h| h.to_string()));
    headings
}

fn base_row<C: LedgerCell>(row: &AnalysisRow<C>) -> Vec<String> {
    let mut fields = render_record(&row.record);
    fields.extend(row.demographics.render());
    fields
}

/// Builds the completion analysis table
pub struct CompletionReport<'a> {
    catalog: &'a AssessmentCatalog,
    modules: &'a ModuleCatalog,
    resolver: ModuleResolver<'a>,
}

impl<'a> CompletionReport<'a> {
    pub fn new(
        catalog: &'a AssessmentCatalog,
        modules: &'a ModuleCatalog,
        resolver: ModuleResolver<'a>,
    ) -> Self {
        Self {
            catalog,
            modules,
            resolver,
        }
    }

    pub fn headings(&self) -> Vec<String> {
        let mut headings = base_headings::<CompletionCell>(self.catalog);
        headings.extend(self.modules.names().into_iter().map(str::to_string));
        headings.extend(SUMMARY_HEADINGS.iter().map(|h| h.to_string()));
        headings
    }

    pub fn row(&self, row: &AnalysisRow<CompletionCell>) -> Result<Vec<String>> {
        let statuses = self.resolver.resolve_all(&row.record, self.modules)?;
        let completed = completed_assessments(&row.record);

        let mut fields = base_row(row);
        fields.extend(statuses.iter().map(|s| s.to_string()));
        fields.push(completed.to_string());
        fields.push(completed_modules(&statuses).to_string());
        fields.push(format!(
            "{:.2}",
            completion_percent(completed, self.catalog.len())
        ));
        Ok(fields)
    }

    /// Every row of `table`; fails before returning anything if one row fails
    pub fn rows(&self, table: &Table<CompletionCell>) -> Result<Vec<Vec<String>>> {
        table.iter().map(|row| self.row(row)).collect()
    }
}

/// Results analysis rows
pub fn results_rows<C: LedgerCell>(table: &Table<C>) -> Vec<Vec<String>> {
    table.iter().map(base_row).collect()
}
