//! Date and timestamp utilities

use crate::{Error, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

/// Date format used by the enrolment, student and results files
pub const DMY_FORMAT: &str = "%d/%m/%Y";

/// Timestamp formats accepted for submission exports, most specific first
const SUBMISSION_FORMATS: [&str; 4] = [
    "%A, %d %B %Y, %I:%M %p",
    "%d %B %Y, %I:%M %p",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Get today's local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Timestamp suffix for generated file names (never collides within a second)
pub fn file_stamp() -> String {
    Local::now().format("%Y-%m-%d-%H%M%S").to_string()
}

/// Parse a submission timestamp from the assessment export
///
/// The export writes e.g. `Thursday, 1 November 2018, 10:23 AM`; a couple of
/// numeric layouts are accepted as well.
pub fn parse_submission_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    SUBMISSION_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| Error::InvalidInput(format!("unrecognised submission timestamp '{}'", text)))
}

/// Parse a `DD/MM/YYYY` date; blanks yield `None`
pub fn parse_dmy(text: &str) -> Result<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, DMY_FORMAT)
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("invalid date '{}': {}", text, e)))
}

/// Format a date as `DD/MM/YYYY`
pub fn format_dmy(date: NaiveDate) -> String {
    date.format(DMY_FORMAT).to_string()
}

/// Whole years between `birth` and `on`
pub fn age_on(birth: NaiveDate, on: NaiveDate) -> i64 {
    let mut years = i64::from(on.year() - birth.year());
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}

/// Days from `start` to `end` (negative if `end` precedes `start`)
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}
