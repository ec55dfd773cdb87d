//! Ledger cell values
//!
//! A cell is the state of one student for one assessment. The completion
//! ledger stores *when* (a month token) or *that it was transferred*; the
//! results ledger stores the grade and the submission date. Both share the
//! write-once merge logic through the [`LedgerCell`] trait.

use asa_common::time::{format_dmy, parse_dmy};
use asa_common::{Error, MonthToken, Result};
use chrono::NaiveDate;
use std::fmt;

/// Serialized form of a transferred completion cell
pub const TRANSFERRED: &str = "Transferred";

/// Behaviour shared by every ledger cell type
pub trait LedgerCell: Clone + PartialEq + fmt::Debug {
    /// Number of CSV columns one assessment occupies
    const WIDTH: usize;

    /// The unfilled value
    fn empty() -> Self;

    /// Whether the cell is still unfilled (and so may be written)
    fn is_empty(&self) -> bool;

    /// Column headings for `assessment`, `WIDTH` entries
    fn headings(assessment: &str) -> Vec<String>;

    /// Parse `WIDTH` raw fields
    fn parse(fields: &[&str]) -> Result<Self>;

    /// Render to `WIDTH` fields
    fn render(&self) -> Vec<String>;
}

/// Completion state of one assessment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CompletionCell {
    #[default]
    Empty,
    /// Completed by grade in the given month
    Month(MonthToken),
    /// Satisfied by cross credit from another institution
    Transferred,
}

impl CompletionCell {
    pub fn month(&self) -> Option<&MonthToken> {
        match self {
            Self::Month(token) => Some(token),
            _ => None,
        }
    }
}

impl fmt::Display for CompletionCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Month(token) => write!(f, "{}", token),
            Self::Transferred => f.write_str(TRANSFERRED),
        }
    }
}

impl LedgerCell for CompletionCell {
    const WIDTH: usize = 1;

    fn empty() -> Self {
        Self::Empty
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn headings(assessment: &str) -> Vec<String> {
        vec![assessment.to_string()]
    }

    fn parse(fields: &[&str]) -> Result<Self> {
        let text = fields.first().map(|f| f.trim()).unwrap_or_default();
        match text {
            "" => Ok(Self::Empty),
            TRANSFERRED => Ok(Self::Transferred),
            other => MonthToken::parse(other).map(Self::Month),
        }
    }

    fn render(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

/// Grade and submission date of one assessment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultCell {
    #[default]
    Empty,
    Graded { grade: String, date: NaiveDate },
}

impl LedgerCell for ResultCell {
    const WIDTH: usize = 2;

    fn empty() -> Self {
        Self::Empty
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn headings(assessment: &str) -> Vec<String> {
        vec![assessment.to_string(), format!("{} Date", assessment)]
    }

    fn parse(fields: &[&str]) -> Result<Self> {
        let grade = fields.first().map(|f| f.trim()).unwrap_or_default();
        let date = fields.get(1).map(|f| f.trim()).unwrap_or_default();

        match (grade.is_empty(), parse_dmy(date)?) {
            (true, None) => Ok(Self::Empty),
            (false, Some(date)) => Ok(Self::Graded {
                grade: grade.to_string(),
                date,
            }),
            (false, None) => Err(Error::Ledger(format!("grade '{}' has no date", grade))),
            (true, Some(date)) => Err(Error::Ledger(format!(
                "date {} has no grade",
                format_dmy(date)
            ))),
        }
    }

    fn render(&self) -> Vec<String> {
        match self {
            Self::Empty => vec![String::new(), String::new()],
            Self::Graded { grade, date } => vec![grade.clone(), format_dmy(*date)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_cell_parse() {
        assert_eq!(CompletionCell::parse(&[""]).unwrap(), CompletionCell::Empty);
        assert_eq!(CompletionCell::parse(&["  "]).unwrap(), CompletionCell::Empty);
        assert_eq!(
            CompletionCell::parse(&["Transferred"]).unwrap(),
            CompletionCell::Transferred
        );
        assert_eq!(
            CompletionCell::parse(&["Jan-19"]).unwrap(),
            CompletionCell::Month(MonthToken::parse("Jan-19").unwrap())
        );
    }

    #[test]
    fn test_completion_cell_rejects_arbitrary_text() {
        assert!(matches!(
            CompletionCell::parse(&["done"]),
            Err(Error::InvalidMonthToken(_))
        ));
    }

    #[test]
    fn test_completion_cell_render() {
        assert_eq!(CompletionCell::Empty.render(), vec![""]);
        assert_eq!(CompletionCell::Transferred.render(), vec!["Transferred"]);
        let month = CompletionCell::Month(MonthToken::parse("Feb-19").unwrap());
        assert_eq!(month.render(), vec!["Feb-19"]);
        assert_eq!(month.month().map(|m| m.as_str()), Some("Feb-19"));
    }

    #[test]
    fn test_result_cell_headings() {
        assert_eq!(ResultCell::headings("Essay 1"), vec!["Essay 1", "Essay 1 Date"]);
    }

    #[test]
    fn test_result_cell_parse() {
        assert_eq!(ResultCell::parse(&["", ""]).unwrap(), ResultCell::Empty);
        let graded = ResultCell::parse(&["Competent", "05/02/2019"]).unwrap();
        assert_eq!(
            graded,
            ResultCell::Graded {
                grade: "Competent".to_string(),
                date: NaiveDate::from_ymd_opt(2019, 2, 5).unwrap(),
            }
        );
        assert_eq!(graded.render(), vec!["Competent", "05/02/2019"]);
    }

    #[test]
    fn test_result_cell_half_filled_is_error() {
        assert!(matches!(
            ResultCell::parse(&["Competent", ""]),
            Err(Error::Ledger(_))
        ));
        assert!(matches!(
            ResultCell::parse(&["", "05/02/2019"]),
            Err(Error::Ledger(_))
        ));
    }
}
