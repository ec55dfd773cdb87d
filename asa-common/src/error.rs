//! Common error types for the assessment analyser

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for analyser operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the analyser crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more required input files are absent
    #[error("Missing required files: {}", display_paths(.0))]
    MissingFiles(Vec<PathBuf>),

    /// Catalog files are inconsistent (missing keys, misaligned lists)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Grade item not present in the assessment catalog
    #[error("Assessment '{assessment}' is not in the catalog (enrolment {enrollment_id})")]
    UnknownAssessment {
        assessment: String,
        enrollment_id: String,
    },

    /// Month token not registered in the month ordering
    #[error("Month '{0}' is not in the month order")]
    UnknownMonth(String),

    /// Cell text that is neither empty, "Transferred" nor a Mmm-YY token
    #[error("Invalid month token: '{0}'")]
    InvalidMonthToken(String),

    /// Ledger snapshot does not match the catalog or is malformed
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Nothing left to merge after mandatory drops
    #[error("No data left to process: {0}")]
    EmptyDelta(String),

    /// Invalid user input or data value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// User asked to quit at a prompt
    #[error("Cancelled by user")]
    Aborted,
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_lists_every_path() {
        let err = Error::MissingFiles(vec![
            PathBuf::from("a.txt"),
            PathBuf::from("b.csv"),
        ]);
        assert_eq!(err.to_string(), "Missing required files: a.txt, b.csv");
    }

    #[test]
    fn test_unknown_assessment_message() {
        let err = Error::UnknownAssessment {
            assessment: "Quiz 9".to_string(),
            enrollment_id: "E1".to_string(),
        };
        assert!(err.to_string().contains("Quiz 9"));
        assert!(err.to_string().contains("E1"));
    }
}
