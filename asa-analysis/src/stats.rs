//! Completion statistics

use crate::resolver::ModuleStatus;
use asa_common::{MonthOrder, MonthToken, Result};
use asa_ledger::{LedgerCell, StudentRecord};
use std::collections::HashMap;

/// Filled assessment cells (transfers count as completed)
pub fn completed_assessments<C: LedgerCell>(record: &StudentRecord<C>) -> usize {
    record.filled()
}

/// Modules that are transferred or completed
pub fn completed_modules(statuses: &[ModuleStatus]) -> usize {
    statuses.iter().filter(|s| s.is_complete()).count()
}

/// `completed / total` rounded to two decimal places; zero when `total` is zero
pub fn completion_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let ratio = completed as f64 / total as f64;
    (ratio * 100.0).round() / 100.0
}

/// Count completions per month, oldest first
///
/// Only `CompletedMonth` statuses are counted and months without any
/// completion are omitted. A month missing from `order` is an error.
pub fn month_counts<'a, I>(statuses: I, order: &MonthOrder) -> Result<Vec<(MonthToken, usize)>>
where
    I: IntoIterator<Item = &'a ModuleStatus>,
{
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for token in statuses.into_iter().filter_map(ModuleStatus::month) {
        *counts.entry(order.rank(token)?).or_insert(0) += 1;
    }

    let mut ranked: Vec<(usize, usize)> = counts.into_iter().collect();
    ranked.sort_unstable_by_key(|(rank, _)| *rank);
    Ok(ranked
        .into_iter()
        .filter_map(|(rank, total)| order.token_at(rank).map(|t| (t.clone(), total)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use asa_common::{EnrolmentIdentity, Error};
    use asa_ledger::CompletionCell;

    fn completed(token: &str) -> ModuleStatus {
        ModuleStatus::CompletedMonth(MonthToken::parse(token).unwrap())
    }

    #[test]
    fn test_completion_percent() {
        assert_eq!(completion_percent(3, 12), 0.25);
        assert_eq!(completion_percent(1, 3), 0.33);
        assert_eq!(completion_percent(2, 3), 0.67);
        assert_eq!(completion_percent(12, 12), 1.0);
        assert_eq!(completion_percent(0, 0), 0.0);
    }

    #[test]
    fn test_completion_percent_monotonic() {
        for total in 1..=40 {
            let mut previous = 0.0;
            for completed in 0..=total {
                let percent = completion_percent(completed, total);
                assert!(percent >= previous, "{}/{}", completed, total);
                previous = percent;
            }
        }
    }

    #[test]
    fn test_counts_include_transfers() {
        let record = StudentRecord::with_cells(
            EnrolmentIdentity {
                enrollment_id: "E1".to_string(),
                student_id: "S1".to_string(),
                name: "Ana".to_string(),
                course: "ABC".to_string(),
            },
            vec![
                CompletionCell::Transferred,
                CompletionCell::Empty,
                CompletionCell::Month(MonthToken::parse("Jan-19").unwrap()),
            ],
        );
        assert_eq!(completed_assessments(&record), 2);

        let statuses = vec![ModuleStatus::Transferred, ModuleStatus::Incomplete, completed("Jan-19")];
        assert_eq!(completed_modules(&statuses), 2);
    }

    #[test]
    fn test_month_counts_chronological() {
        let order = MonthOrder::new(["Nov-18", "Dec-18", "Jan-19", "Feb-19"]).unwrap();
        let statuses = vec![
            completed("Jan-19"),
            completed("Nov-18"),
            ModuleStatus::Transferred,
            completed("Jan-19"),
            ModuleStatus::Incomplete,
        ];
        let counts = month_counts(&statuses, &order).unwrap();
        let rendered: Vec<(String, usize)> =
            counts.into_iter().map(|(m, n)| (m.to_string(), n)).collect();
        assert_eq!(
            rendered,
            vec![("Nov-18".to_string(), 1), ("Jan-19".to_string(), 2)]
        );
    }

    #[test]
    fn test_month_counts_unknown_month() {
        let order = MonthOrder::new(["Nov-18"]).unwrap();
        let statuses = vec![completed("Jun-17")];
        assert!(matches!(
            month_counts(&statuses, &order),
            Err(Error::UnknownMonth(_))
        ));
    }
}
