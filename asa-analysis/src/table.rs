//! Joined analysis projection
//!
//! Each ledger row is left-joined with enrolment data (by enrolment id),
//! student data (by student id) and graduation dates (by enrolment id).
//! The derived columns used by filters are materialised here, once:
//!
//! - `Age`: whole years from date of birth to enrolment start
//! - `Pacific`: ethnicity listed in the Pacific nations file
//! - `EnrolLength`: days enrolled, by status
//!
//! | Status              | EnrolLength        |
//! |---------------------|--------------------|
//! | Active, Suspended   | start → today      |
//! | Graduated           | start → graduation |
//! | Expired             | start → expiry     |
//! | anything else       | none               |
//!
//! Tables are shared immutably (`Arc`); filtering builds new tables.

use asa_common::flatfile::load_records;
use asa_common::time::{age_on, days_between, format_dmy, parse_dmy};
use asa_common::{CourseFiles, Diagnostics, EnrolmentIdentity, Result};
use asa_ledger::{LedgerCell, RecordStore, StudentRecord};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

const STAGE: &str = "projection";

/// Demographic columns appended after the ledger columns
pub const DEMOGRAPHIC_HEADINGS: [&str; 11] = [
    "StartDate",
    "ExpiryDate",
    "Status",
    "Tutor",
    "DateOfBirth",
    "Gender",
    "Ethnicity",
    "GraduationDate",
    "Pacific",
    "Age",
    "EnrolLength",
];

/// One row of `enrolment_data.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct EnrolmentData {
    #[serde(rename = "EnrolmentID")]
    pub enrollment_id: String,
    #[serde(rename = "StartDate", default)]
    pub start_date: String,
    #[serde(rename = "ExpiryDate", default)]
    pub expiry_date: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Tutor", default)]
    pub tutor: String,
}

/// One row of `student_data.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct StudentData {
    #[serde(rename = "StudentID")]
    pub student_id: String,
    #[serde(rename = "DateOfBirth", default)]
    pub date_of_birth: String,
    #[serde(rename = "Gender", default)]
    pub gender: String,
    #[serde(rename = "Ethnicity", default)]
    pub ethnicity: String,
}

/// One row of `graduation_dates.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct GraduationDate {
    #[serde(rename = "EnrolmentID")]
    pub enrollment_id: String,
    #[serde(rename = "GraduationDate", default)]
    pub graduation_date: String,
}

/// Joined and derived columns of one analysis row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Demographics {
    pub start_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub tutor: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub graduation_date: Option<NaiveDate>,
    pub pacific: Option<bool>,
    pub age: Option<i64>,
    pub enrol_length: Option<i64>,
}

impl Demographics {
    /// Render in `DEMOGRAPHIC_HEADINGS` order
    pub fn render(&self) -> Vec<String> {
        let date = |d: &Option<NaiveDate>| d.map(format_dmy).unwrap_or_default();
        let text = |t: &Option<String>| t.clone().unwrap_or_default();
        let number = |n: &Option<i64>| n.map(|v| v.to_string()).unwrap_or_default();
        vec![
            date(&self.start_date),
            date(&self.expiry_date),
            text(&self.status),
            text(&self.tutor),
            date(&self.date_of_birth),
            text(&self.gender),
            text(&self.ethnicity),
            date(&self.graduation_date),
            match self.pacific {
                Some(true) => "Yes".to_string(),
                Some(false) => "No".to_string(),
                None => String::new(),
            },
            number(&self.age),
            number(&self.enrol_length),
        ]
    }
}

/// Days enrolled for a student with `status`
pub fn enrol_length(
    status: Option<&str>,
    start: Option<NaiveDate>,
    expiry: Option<NaiveDate>,
    graduation: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<i64> {
    let start = start?;
    let end = match status? {
        "Active" | "Suspended" => Some(today),
        "Graduated" => graduation,
        "Expired" => expiry,
        _ => None,
    }?;
    Some(days_between(start, end))
}

/// One ledger row with its demographics
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRow<C> {
    pub record: StudentRecord<C>,
    pub demographics: Demographics,
}

impl<C: LedgerCell> AnalysisRow<C> {
    pub fn identity(&self) -> &EnrolmentIdentity {
        &self.record.identity
    }

    pub fn enrollment_id(&self) -> &str {
        self.record.enrollment_id()
    }
}

/// Immutable analysis table
pub type Table<C> = Arc<Vec<AnalysisRow<C>>>;

/// Demographic lookup tables
#[derive(Debug, Clone, Default)]
pub struct DemographicSources {
    enrolments: HashMap<String, EnrolmentData>,
    students: HashMap<String, StudentData>,
    graduations: HashMap<String, String>,
    pacific_nations: HashSet<String>,
}

impl DemographicSources {
    /// Index the source rows; the first row per key wins
    pub fn new(
        enrolments: Vec<EnrolmentData>,
        students: Vec<StudentData>,
        graduations: Vec<GraduationDate>,
        pacific_nations: HashSet<String>,
    ) -> Self {
        let mut sources = Self {
            pacific_nations,
            ..Self::default()
        };
        for row in enrolments {
            sources.enrolments.entry(row.enrollment_id.clone()).or_insert(row);
        }
        for row in students {
            sources.students.entry(row.student_id.clone()).or_insert(row);
        }
        for row in graduations {
            sources
                .graduations
                .entry(row.enrollment_id)
                .or_insert(row.graduation_date);
        }
        sources
    }

    /// Load the shared demographic files of the data folder
    pub fn load(files: &CourseFiles) -> Result<Self> {
        let sources = Self::new(
            load_records(&files.enrolment_data())?,
            load_records(&files.student_data())?,
            load_records(&files.graduation_dates())?,
            files.load_pacific_nations()?,
        );
        info!(
            enrolments = sources.enrolments.len(),
            students = sources.students.len(),
            graduations = sources.graduations.len(),
            "Loaded demographic data"
        );
        Ok(sources)
    }

    /// Join and derive the demographics of one student
    ///
    /// Unparseable dates are treated as missing and reported.
    pub fn demographics_for(
        &self,
        identity: &EnrolmentIdentity,
        today: NaiveDate,
        diagnostics: &mut Diagnostics,
    ) -> Demographics {
        let enrolment = self.enrolments.get(&identity.enrollment_id);
        let student = self.students.get(&identity.student_id);
        let mut date = |field: &str, text: Option<&String>| -> Option<NaiveDate> {
            match parse_dmy(text.map(String::as_str).unwrap_or_default()) {
                Ok(date) => date,
                Err(e) => {
                    diagnostics.warn(
                        STAGE,
                        format!("{} of enrolment {}: {}", field, identity.enrollment_id, e),
                    );
                    None
                }
            }
        };

        let start_date = date("StartDate", enrolment.map(|e| &e.start_date));
        let expiry_date = date("ExpiryDate", enrolment.map(|e| &e.expiry_date));
        let date_of_birth = date("DateOfBirth", student.map(|s| &s.date_of_birth));
        let graduation_date = date("GraduationDate", self.graduations.get(&identity.enrollment_id));

        let status = enrolment.and_then(|e| non_blank(&e.status));
        let ethnicity = student.and_then(|s| non_blank(&s.ethnicity));
        let age = match (date_of_birth, start_date) {
            (Some(birth), Some(start)) => Some(age_on(birth, start)),
            _ => None,
        };

        Demographics {
            enrol_length: enrol_length(
                status.as_deref(),
                start_date,
                expiry_date,
                graduation_date,
                today,
            ),
            pacific: ethnicity.as_ref().map(|e| self.pacific_nations.contains(e)),
            start_date,
            expiry_date,
            tutor: enrolment.and_then(|e| non_blank(&e.tutor)),
            date_of_birth,
            gender: student.and_then(|s| non_blank(&s.gender)),
            graduation_date,
            status,
            ethnicity,
            age,
        }
    }
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Build the analysis table for every record of `store`
pub fn project<C: LedgerCell>(
    store: &RecordStore<C>,
    sources: &DemographicSources,
    today: NaiveDate,
) -> (Table<C>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let rows = store
        .iter()
        .map(|record| AnalysisRow {
            demographics: sources.demographics_for(&record.identity, today, &mut diagnostics),
            record: record.clone(),
        })
        .collect();
    (Arc::new(rows), diagnostics)
}
