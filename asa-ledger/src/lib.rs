//! # ASA Ledger
//!
//! Reconciles assessment exports into the per-student course ledgers.
//!
//! - [`cell`]: completion and results cell values
//! - [`store`]: student records and the record store
//! - [`identity`]: submission rows and name resolution
//! - [`normalizer`]: submission rows → transfer / graded facts
//! - [`merge`]: write-once upsert of facts into a store
//! - [`snapshot`]: ledger CSV read/write
//! - [`update`]: the full update cycle

pub mod cell;
pub mod identity;
pub mod merge;
pub mod normalizer;
pub mod snapshot;
pub mod store;
pub mod update;

pub use cell::{CompletionCell, LedgerCell, ResultCell};
pub use merge::{Fact, MergeReport};
pub use store::{RecordStore, StudentRecord};
pub use update::{LedgerKind, UpdateCycle, UpdateOutcome};
