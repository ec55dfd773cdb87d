//! Course catalog: assessments, modules and passing scores
//!
//! The assessment catalog fixes the column layout of every ledger for the
//! course: position `i` in the catalog is cell `i` of each student record.

use crate::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Ordered list of assessment names for one course version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentCatalog {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl AssessmentCatalog {
    /// Build a catalog, rejecting blank or repeated names
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut positions = HashMap::new();

        for name in names {
            let name: String = name.into();
            if name.trim().is_empty() {
                return Err(Error::Catalog("blank assessment name".to_string()));
            }
            if positions.insert(name.clone(), ordered.len()).is_some() {
                return Err(Error::Catalog(format!(
                    "assessment '{}' listed more than once",
                    name
                )));
            }
            ordered.push(name);
        }

        if ordered.is_empty() {
            return Err(Error::Catalog("assessment catalog is empty".to_string()));
        }

        Ok(Self {
            names: ordered,
            positions,
        })
    }

    /// Cell offset of `name`, if catalogued
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Cell offset of `name` for a fact belonging to `enrollment_id`
    ///
    /// An uncatalogued grade item means the export and the catalog belong to
    /// different courses or versions; there is no safe column to write to.
    pub fn require(&self, name: &str, enrollment_id: &str) -> Result<usize> {
        self.position(name).ok_or_else(|| Error::UnknownAssessment {
            assessment: name.to_string(),
            enrollment_id: enrollment_id.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A named group of assessments required to complete a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDefinition {
    pub name: String,
    pub assessments: Vec<String>,
}

impl ModuleDefinition {
    pub fn new(name: impl Into<String>, assessments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            assessments,
        }
    }
}

/// All modules for a course, in file order
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<ModuleDefinition>,
}

impl ModuleCatalog {
    /// Validate module definitions against the assessment catalog
    ///
    /// Every required assessment must exist in the catalog and module names
    /// must be unique.
    pub fn new(modules: Vec<ModuleDefinition>, catalog: &AssessmentCatalog) -> Result<Self> {
        let mut seen = HashSet::new();
        for module in &modules {
            if !seen.insert(module.name.as_str()) {
                return Err(Error::Catalog(format!(
                    "module '{}' defined more than once",
                    module.name
                )));
            }
            if module.assessments.is_empty() {
                return Err(Error::Catalog(format!(
                    "module '{}' has no required assessments",
                    module.name
                )));
            }
            if let Some(missing) = module.assessments.iter().find(|a| !catalog.contains(a)) {
                return Err(Error::Catalog(format!(
                    "module '{}' requires '{}' which is not in the assessment catalog",
                    module.name, missing
                )));
            }
        }
        Ok(Self { modules })
    }

    /// Build from raw rows (`module, assessment, assessment, ...`)
    ///
    /// Blank cells are dropped, as are rows that end up empty.
    pub fn from_rows(rows: Vec<Vec<String>>, catalog: &AssessmentCatalog) -> Result<Self> {
        let modules = rows
            .into_iter()
            .filter_map(|row| {
                let mut cells = row
                    .into_iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty());
                let name = cells.next()?;
                Some(ModuleDefinition::new(name, cells.collect()))
            })
            .collect();
        Self::new(modules, catalog)
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Minimum passing score per assessment
///
/// `None` means the assessment has no usable threshold and can never be
/// completed by grade (only by transfer).
#[derive(Debug, Clone, Default)]
pub struct PassingScores {
    minimums: HashMap<String, Option<i64>>,
}

impl PassingScores {
    /// Pair scores with catalog names by position
    pub fn aligned(catalog: &AssessmentCatalog, scores: Vec<Option<i64>>) -> Result<Self> {
        if scores.len() != catalog.len() {
            return Err(Error::Catalog(format!(
                "{} passing scores for {} assessments",
                scores.len(),
                catalog.len()
            )));
        }

        let minimums = catalog
            .names()
            .iter()
            .cloned()
            .zip(scores)
            .collect();
        Ok(Self { minimums })
    }

    /// Parse one passing-score entry; `None`, blanks and non-integers yield no threshold
    pub fn parse_entry(text: &str) -> Option<i64> {
        text.trim().parse::<i64>().ok()
    }

    /// Whether `score` meets the minimum for `assessment`
    pub fn passes(&self, assessment: &str, score: i64) -> bool {
        matches!(self.minimums.get(assessment), Some(Some(min)) if score >= *min)
    }

    pub fn minimum(&self, assessment: &str) -> Option<i64> {
        self.minimums.get(assessment).copied().flatten()
    }
}
