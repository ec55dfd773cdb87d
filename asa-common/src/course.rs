//! Course file layout within the data folder
//!
//! Every per-course input is named `<Kind>_<course>.<ext>`; shared inputs
//! (month order, demographics) have fixed names. `CourseFiles` builds the
//! paths and loads the catalog-style files into validated types.

use crate::flatfile::{self, load_entries, load_lines, load_records, load_rows};
use crate::{
    AssessmentCatalog, Error, ModuleCatalog, MonthOrder, PassingScores, Result,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// List of valid course codes
pub const COURSE_CODES_FILE: &str = "Course_codes.txt";
/// Month order, oldest first
pub const MONTH_ORDER_FILE: &str = "months_short.txt";
pub const ENROLMENT_DATA_FILE: &str = "enrolment_data.csv";
pub const STUDENT_DATA_FILE: &str = "student_data.csv";
pub const GRADUATION_DATES_FILE: &str = "graduation_dates.csv";
pub const PACIFIC_NATIONS_FILE: &str = "pacific_island_nations.txt";
pub const STUDENT_INFO_FILE: &str = "student_info.csv";

/// One row of the identity table (`Enrolment_IDs_<course>.csv`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnrolmentIdentity {
    #[serde(rename = "EnrolmentID")]
    pub enrollment_id: String,
    #[serde(rename = "StudentID")]
    pub student_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Course")]
    pub course: String,
}

/// Paths and loaders for one course's files
#[derive(Debug, Clone)]
pub struct CourseFiles {
    data_dir: PathBuf,
    course: String,
}

impl CourseFiles {
    /// Open the files of `course`, which must be listed in `Course_codes.txt`
    pub fn open(data_dir: &Path, course: &str) -> Result<Self> {
        let course = course.trim();
        let codes_path = data_dir.join(COURSE_CODES_FILE);
        flatfile::confirm_files(&[&codes_path])?;

        let codes = load_lines(&codes_path)?;
        if !codes.iter().any(|c| c == course) {
            return Err(Error::InvalidInput(format!(
                "course code '{}' is not listed in {}",
                course, COURSE_CODES_FILE
            )));
        }

        debug!(course, data_dir = %data_dir.display(), "Course validated");
        Ok(Self::unchecked(data_dir, course))
    }

    /// Build without checking the course code list
    pub fn unchecked(data_dir: &Path, course: &str) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            course: course.to_string(),
        }
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn per_course(&self, kind: &str, extension: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}.{}", kind, self.course, extension))
    }

    fn shared(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn assessment_names(&self) -> PathBuf {
        self.per_course("Assessment_Names", "txt")
    }

    pub fn modules(&self) -> PathBuf {
        self.per_course("Modules", "csv")
    }

    pub fn passing_scores(&self) -> PathBuf {
        self.per_course("Passing_Scores", "txt")
    }

    pub fn month_order(&self) -> PathBuf {
        self.shared(MONTH_ORDER_FILE)
    }

    pub fn enrolment_ids(&self) -> PathBuf {
        self.per_course("Enrolment_IDs", "csv")
    }

    pub fn duplicate_names(&self) -> PathBuf {
        self.per_course("Duplicate_Names", "txt")
    }

    pub fn completion_ledger(&self) -> PathBuf {
        self.per_course("Master_Completion", "csv")
    }

    pub fn results_ledger(&self) -> PathBuf {
        self.per_course("Master_Results", "csv")
    }

    pub fn assessment_downloads(&self) -> PathBuf {
        self.per_course("Assessment_Downloads", "csv")
    }

    pub fn enrolment_data(&self) -> PathBuf {
        self.shared(ENROLMENT_DATA_FILE)
    }

    pub fn student_data(&self) -> PathBuf {
        self.shared(STUDENT_DATA_FILE)
    }

    pub fn graduation_dates(&self) -> PathBuf {
        self.shared(GRADUATION_DATES_FILE)
    }

    pub fn pacific_nations(&self) -> PathBuf {
        self.shared(PACIFIC_NATIONS_FILE)
    }

    pub fn student_info(&self) -> PathBuf {
        self.shared(STUDENT_INFO_FILE)
    }

    /// Timestamped output path `<data>/<prefix>_<stamp>.<ext>`
    pub fn output(&self, prefix: &str, extension: &str) -> PathBuf {
        flatfile::stamped_path(&self.data_dir, prefix, extension)
    }

    /// Output path with a caller-chosen stamp, for runs that write several files
    pub fn output_at(&self, prefix: &str, stamp: &str, extension: &str) -> PathBuf {
        flatfile::path_at(&self.data_dir, prefix, stamp, extension)
    }

    pub fn load_catalog(&self) -> Result<AssessmentCatalog> {
        let catalog = AssessmentCatalog::new(load_lines(&self.assessment_names())?)?;
        info!(course = %self.course, assessments = catalog.len(), "Loaded assessment catalog");
        Ok(catalog)
    }

    pub fn load_modules(&self, catalog: &AssessmentCatalog) -> Result<ModuleCatalog> {
        let modules = ModuleCatalog::from_rows(load_rows(&self.modules())?, catalog)?;
        info!(course = %self.course, modules = modules.len(), "Loaded module definitions");
        Ok(modules)
    }

    pub fn load_passing_scores(&self, catalog: &AssessmentCatalog) -> Result<PassingScores> {
        let scores = load_entries(&self.passing_scores())?
            .iter()
            .map(|entry| PassingScores::parse_entry(entry))
            .collect();
        PassingScores::aligned(catalog, scores)
    }

    pub fn load_month_order(&self) -> Result<MonthOrder> {
        let order = MonthOrder::new(load_lines(&self.month_order())?)?;
        debug!(months = order.len(), "Loaded month order");
        Ok(order)
    }

    pub fn load_identities(&self) -> Result<Vec<EnrolmentIdentity>> {
        load_records(&self.enrolment_ids())
    }

    pub fn load_duplicate_names(&self) -> Result<HashSet<String>> {
        Ok(load_lines(&self.duplicate_names())?.into_iter().collect())
    }

    pub fn load_pacific_nations(&self) -> Result<HashSet<String>> {
        Ok(load_lines(&self.pacific_nations())?.into_iter().collect())
    }
}
