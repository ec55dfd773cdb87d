//! Delta normalizer: resolved submission rows → classified facts
//!
//! **Algorithm (per row):**
//! 1. Administrative grade items (e.g. `Course total`) are dropped
//! 2. Feedback mentioning a transfer marker yields a `Transfer` fact,
//!    whatever the score
//! 3. Otherwise the truncated score is compared with the assessment's
//!    passing minimum; failing rows are dropped, passing rows yield a
//!    `GradedCompletion` fact dated by the submission timestamp

use crate::cell::{CompletionCell, ResultCell};
use crate::identity::ResolvedSubmission;
use crate::merge::Fact;
use asa_common::config::UpdateConfig;
use asa_common::time::parse_submission_timestamp;
use asa_common::{
    AssessmentCatalog, Diagnostics, EnrolmentIdentity, MonthToken, PassingScores, Result,
};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

const STAGE: &str = "normalize";

/// What a submission row says about an assessment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactKind {
    /// Passed by grade on `date`, recorded under `month`
    GradedCompletion { month: MonthToken, date: NaiveDate },
    /// Credited from another institution
    Transfer,
}

/// One classified outcome ready to merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFact {
    pub identity: EnrolmentIdentity,
    pub assessment: String,
    pub kind: FactKind,
}

impl ClassifiedFact {
    /// Completion-ledger form of this fact
    pub fn completion(&self) -> Fact<CompletionCell> {
        let value = match &self.kind {
            FactKind::GradedCompletion { month, .. } => CompletionCell::Month(month.clone()),
            FactKind::Transfer => CompletionCell::Transferred,
        };
        Fact::new(self.identity.clone(), &self.assessment, value)
    }

    /// Results-ledger form of this fact; transfers have none
    pub fn result(&self, grade_label: &str) -> Option<Fact<ResultCell>> {
        match &self.kind {
            FactKind::GradedCompletion { date, .. } => Some(Fact::new(
                self.identity.clone(),
                &self.assessment,
                ResultCell::Graded {
                    grade: grade_label.to_string(),
                    date: *date,
                },
            )),
            FactKind::Transfer => None,
        }
    }
}

/// Case-insensitive substring test for transfer / cross-credit feedback
#[derive(Debug, Clone)]
pub struct TransferClassifier {
    markers: Vec<String>,
}

impl TransferClassifier {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn is_transfer(&self, feedback: &str) -> bool {
        let feedback = feedback.to_lowercase();
        self.markers.iter().any(|m| feedback.contains(m.as_str()))
    }
}

/// Parse a revised grade, truncating toward zero; non-numeric yields `None`
pub fn parse_score(text: &str) -> Option<i64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
        .map(|score| score.trunc() as i64)
}

/// Facts split by kind, each in export order
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub transfers: Vec<ClassifiedFact>,
    pub graded: Vec<ClassifiedFact>,
}

impl NormalizedBatch {
    pub fn len(&self) -> usize {
        self.transfers.len() + self.graded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty() && self.graded.is_empty()
    }
}

/// Classifies resolved submission rows
pub struct DeltaNormalizer<'a> {
    non_assessment: HashSet<String>,
    classifier: TransferClassifier,
    catalog: &'a AssessmentCatalog,
    scores: &'a PassingScores,
}

impl<'a> DeltaNormalizer<'a> {
    pub fn new(
        config: &UpdateConfig,
        catalog: &'a AssessmentCatalog,
        scores: &'a PassingScores,
    ) -> Self {
        Self {
            non_assessment: config
                .non_assessment_items
                .iter()
                .map(|item| item.trim().to_string())
                .collect(),
            classifier: TransferClassifier::new(&config.transfer_markers),
            catalog,
            scores,
        }
    }

    /// Classify one row; `None` when the row carries no fact
    ///
    /// A grade item that is neither administrative nor catalogued is an
    /// `UnknownAssessment` error.
    pub fn normalize(&self, submission: &ResolvedSubmission) -> Result<Option<ClassifiedFact>> {
        let row = &submission.row;
        let assessment = row.grade_item.trim();

        if self.non_assessment.contains(assessment) {
            return Ok(None);
        }
        self.catalog
            .require(assessment, &submission.identity.enrollment_id)?;

        let kind = if self.classifier.is_transfer(&row.feedback) {
            FactKind::Transfer
        } else {
            let passed = parse_score(&row.revised_grade)
                .map(|score| self.scores.passes(assessment, score))
                .unwrap_or(false);
            if !passed {
                return Ok(None);
            }
            let date = parse_submission_timestamp(&row.timestamp)?.date();
            FactKind::GradedCompletion {
                month: MonthToken::from_date(date),
                date,
            }
        };

        Ok(Some(ClassifiedFact {
            identity: submission.identity.clone(),
            assessment: assessment.to_string(),
            kind,
        }))
    }

    /// Classify a whole export
    pub fn normalize_batch(
        &self,
        submissions: &[ResolvedSubmission],
    ) -> Result<(NormalizedBatch, Diagnostics)> {
        let mut batch = NormalizedBatch::default();
        let mut diagnostics = Diagnostics::new();
        let mut dropped = 0usize;

        for submission in submissions {
            match self.normalize(submission)? {
                Some(fact) => match fact.kind {
                    FactKind::Transfer => batch.transfers.push(fact),
                    FactKind::GradedCompletion { .. } => batch.graded.push(fact),
                },
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            diagnostics.note(
                STAGE,
                format!("{} rows were administrative or below the passing score", dropped),
            );
        }
        debug!(
            transfers = batch.transfers.len(),
            graded = batch.graded.len(),
            dropped,
            "Normalized submission rows"
        );
        Ok((batch, diagnostics))
    }
}
