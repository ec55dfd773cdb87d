//! # ASA Common Library
//!
//! Shared code for the assessment analyser tools including:
//! - Error type used by every crate
//! - Configuration loading and data folder resolution
//! - Course catalog files (assessments, modules, passing scores)
//! - Month ordering and month-token utilities
//! - Diagnostics collection
//! - Flat-file helpers

pub mod catalog;
pub mod config;
pub mod course;
pub mod diagnostics;
pub mod error;
pub mod flatfile;
pub mod month;
pub mod time;

pub use catalog::{AssessmentCatalog, ModuleCatalog, ModuleDefinition, PassingScores};
pub use config::{Settings, TomlConfig};
pub use course::{CourseFiles, EnrolmentIdentity};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{Error, Result};
pub use month::{MonthOrder, MonthToken, Resolve};
