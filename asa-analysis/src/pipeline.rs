//! Filter Pipeline
//!
//! Narrows the completion and results tables with a sequence of row
//! filters. Both tables are filtered by the same predicate.
//!
//! **Algorithm (per filter):**
//! 1. Build candidate tables holding only the rows the filter keeps
//! 2. Either candidate empty ⇒ reject: current tables stay as they were and
//!    the filter is not recorded
//! 3. Otherwise the candidates become the current tables and the filter is
//!    recorded as accepted
//!
//! When the driver has no more filters and at least one was accepted, it is
//! asked once whether to keep them; declining reverts to the original
//! tables. Tables are never mutated in place, so rejection and revert just
//! keep or restore the earlier `Arc`s.

use crate::filter::RowFilter;
use crate::table::Table;
use asa_common::{Diagnostics, Result};
use asa_ledger::LedgerCell;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{info, warn};

const STAGE: &str = "filter";

/// Outcome of trying one filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Committed; rows left in each table
    Accepted { completion: usize, results: usize },
    /// Would have emptied a table; nothing changed
    Rejected,
}

/// Supplies filters to the pipeline and decides what to keep
///
/// The menu implements this interactively; [`FilterList`] replays filters
/// given up front.
pub trait FilterDriver {
    /// Next filter to try, or `None` when done
    fn next_filter(&mut self, accepted: &[RowFilter]) -> Result<Option<RowFilter>>;

    /// A filter was committed
    fn filter_accepted(&mut self, _filter: &RowFilter, _outcome: TrialOutcome) {}

    /// A filter would have emptied a table and was discarded
    fn filter_rejected(&mut self, _filter: &RowFilter) {}

    /// Keep the accepted filters (`true`) or revert to the original tables
    fn retain_filters(&mut self, _accepted: &[RowFilter]) -> Result<bool> {
        Ok(true)
    }
}

/// Driver over a fixed list of filters; accepted filters are always kept
#[derive(Debug, Clone, Default)]
pub struct FilterList {
    queue: VecDeque<RowFilter>,
}

impl FilterList {
    pub fn new(filters: Vec<RowFilter>) -> Self {
        Self {
            queue: filters.into(),
        }
    }
}

impl FilterDriver for FilterList {
    fn next_filter(&mut self, _accepted: &[RowFilter]) -> Result<Option<RowFilter>> {
        Ok(self.queue.pop_front())
    }
}

/// Tables handed on to analysis
#[derive(Debug, Clone)]
pub struct Filtered<A, B> {
    pub completion: Table<A>,
    pub results: Table<B>,
    /// Filters in effect (empty after a revert)
    pub filters: Vec<RowFilter>,
    pub diagnostics: Diagnostics,
}

/// Trial/commit state over a completion table and a results table
#[derive(Debug)]
pub struct FilterPipeline<A, B> {
    original: (Table<A>, Table<B>),
    current: (Table<A>, Table<B>),
    accepted: Vec<RowFilter>,
    diagnostics: Diagnostics,
}

impl<A: LedgerCell, B: LedgerCell> FilterPipeline<A, B> {
    pub fn new(completion: Table<A>, results: Table<B>) -> Self {
        Self {
            current: (Arc::clone(&completion), Arc::clone(&results)),
            original: (completion, results),
            accepted: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn completion(&self) -> &Table<A> {
        &self.current.0
    }

    pub fn results(&self) -> &Table<B> {
        &self.current.1
    }

    pub fn accepted(&self) -> &[RowFilter] {
        &self.accepted
    }

    /// Apply `filter` if it leaves both tables non-empty
    pub fn try_filter(&mut self, filter: RowFilter) -> TrialOutcome {
        let completion: Vec<_> = self
            .current
            .0
            .iter()
            .filter(|row| filter.keeps(*row))
            .cloned()
            .collect();
        let results: Vec<_> = self
            .current
            .1
            .iter()
            .filter(|row| filter.keeps(*row))
            .cloned()
            .collect();

        if completion.is_empty() || results.is_empty() {
            warn!(filter = %filter, "Filter would leave no students; not applied");
            self.diagnostics.warn(
                STAGE,
                format!("'{}' would leave no students and was not applied", filter),
            );
            return TrialOutcome::Rejected;
        }

        let outcome = TrialOutcome::Accepted {
            completion: completion.len(),
            results: results.len(),
        };
        info!(
            filter = %filter,
            completion = completion.len(),
            results = results.len(),
            "Filter applied"
        );
        self.current = (Arc::new(completion), Arc::new(results));
        self.accepted.push(filter);
        outcome
    }

    /// Pull filters from `driver` until it is done, then settle the result
    pub fn run<D: FilterDriver>(mut self, driver: &mut D) -> Result<Filtered<A, B>> {
        while let Some(filter) = driver.next_filter(&self.accepted)? {
            match self.try_filter(filter.clone()) {
                TrialOutcome::Rejected => driver.filter_rejected(&filter),
                accepted => driver.filter_accepted(&filter, accepted),
            }
        }

        if self.accepted.is_empty() {
            return Ok(self.revert());
        }
        if driver.retain_filters(&self.accepted)? {
            Ok(self.finish())
        } else {
            info!(filters = self.accepted.len(), "Filters discarded; using original data");
            Ok(self.revert())
        }
    }

    /// Keep the current tables and filters
    pub fn finish(self) -> Filtered<A, B> {
        Filtered {
            completion: self.current.0,
            results: self.current.1,
            filters: self.accepted,
            diagnostics: self.diagnostics,
        }
    }

    /// Drop every accepted filter and return the original tables
    pub fn revert(self) -> Filtered<A, B> {
        Filtered {
            completion: self.original.0,
            results: self.original.1,
            filters: Vec::new(),
            diagnostics: self.diagnostics,
        }
    }
}
