//! Single-module analysis
//!
//! Counts completions of one module per month and lists the completing
//! students with their email address. Transfers are not counted: a student
//! with any transferred assessment in the module is left out.

use crate::resolver::{ModuleResolver, ModuleStatus};
use crate::stats::month_counts;
use asa_common::flatfile::OutputSet;
use asa_common::time::file_stamp;
use asa_common::{
    AssessmentCatalog, CourseFiles, ModuleDefinition, MonthOrder, MonthToken, Result,
};
use asa_ledger::{CompletionCell, RecordStore};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// One row of `student_info.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct StudentInfo {
    #[serde(rename = "StudentID")]
    pub student_id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Email", default)]
    pub email: String,
}

/// A student who completed the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCompletion {
    pub student_id: String,
    pub name: String,
    pub email: Option<String>,
    pub month: MonthToken,
}

/// Completion counts and completing students for one module
#[derive(Debug, Clone)]
pub struct ModuleReport {
    pub module: String,
    /// Completions per month, oldest first; months without completions omitted
    pub counts: Vec<(MonthToken, usize)>,
    pub students: Vec<ModuleCompletion>,
}

impl ModuleReport {
    /// Module name as used in output file names
    pub fn file_stem(&self) -> String {
        self.module.replace(' ', "_")
    }

    /// Write the counts and student files; returns their paths
    pub fn write(&self, files: &CourseFiles) -> Result<(PathBuf, PathBuf)> {
        let stem = format!("{}_{}", files.course(), self.file_stem());
        let stamp = file_stamp();
        let mut outputs = OutputSet::new();

        let counts_path = files.output_at(&format!("{}_Completion_Counts", stem), &stamp, "csv");
        outputs.add_table(
            counts_path.clone(),
            &["Month", "Total"],
            self.counts
                .iter()
                .map(|(month, total)| vec![month.to_string(), total.to_string()]),
        )?;

        let students_path = files.output_at(&format!("{}_Students", stem), &stamp, "csv");
        outputs.add_table(
            students_path.clone(),
            &["StudentID", "Name", "Email", self.module.as_str()],
            self.students.iter().map(|s| {
                vec![
                    s.student_id.clone(),
                    s.name.clone(),
                    s.email.clone().unwrap_or_default(),
                    s.month.to_string(),
                ]
            }),
        )?;
        outputs.commit()?;

        info!(
            module = %self.module,
            counts = %counts_path.display(),
            students = %students_path.display(),
            "Saved module analysis"
        );
        Ok((counts_path, students_path))
    }
}

/// Analyse `module` over every student in the completion ledger
pub fn analyse_module(
    store: &RecordStore<CompletionCell>,
    module: &ModuleDefinition,
    catalog: &AssessmentCatalog,
    order: &MonthOrder,
    student_info: &[StudentInfo],
) -> Result<ModuleReport> {
    let resolver = ModuleResolver::new(catalog, order, false);
    let mut emails: HashMap<&str, &str> = HashMap::new();
    for row in student_info {
        emails
            .entry(row.student_id.as_str())
            .or_insert(row.email.as_str());
    }

    let mut statuses = Vec::new();
    let mut students = Vec::new();
    for record in store.iter() {
        let status = resolver.resolve(record, module)?;
        if let ModuleStatus::CompletedMonth(month) = &status {
            let identity = &record.identity;
            students.push(ModuleCompletion {
                student_id: identity.student_id.clone(),
                name: identity.name.clone(),
                email: emails
                    .get(identity.student_id.as_str())
                    .map(|e| e.trim())
                    .filter(|e| !e.is_empty())
                    .map(str::to_string),
                month: month.clone(),
            });
            statuses.push(status);
        }
    }

    let counts = month_counts(&statuses, order)?;
    info!(
        module = %module.name,
        completed = students.len(),
        months = counts.len(),
        "Analysed module"
    );
    Ok(ModuleReport {
        module: module.name.clone(),
        counts,
        students,
    })
}
