//! Row filters for the analysis tables
//!
//! A closed set of filter kinds, each a pure `keep | drop` predicate over
//! one analysis row. A row lacking the filtered value is always dropped.
//!
//! Filters can also be written as `kind:args` for the command line:
//!
//! ```text
//! age:18-24        age:65+          course:ON        course-code:ADV-ON-001
//! enrol:..90       enrol:30..       enrol:30..90     pacific:yes
//! ethnicity:Maori  status:!Active   status:Active|Suspended
//! gender:Female    tutor:Jane Doe   tutor:A Smith|B Jones
//! ```

use crate::table::AnalysisRow;
use asa_common::{Error, Result};
use asa_ledger::LedgerCell;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Preset age bands, inclusive
pub const AGE_BANDS: [(i64, i64); 7] = [
    (0, 17),
    (18, 24),
    (25, 34),
    (35, 44),
    (45, 54),
    (55, 64),
    (65, 120),
];

/// Course-code fragments marking online, part-time and CPD enrolments
pub const COURSE_FAMILIES: [(&str, &str); 3] =
    [("Online", "ON"), ("Part-time", "PT"), ("CPD", "CPD")];

/// Filter groups, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterGroup {
    Age,
    Course,
    EnrolmentLength,
    Ethnicity,
    Gender,
    Status,
    Tutor,
}

impl FilterGroup {
    pub const ALL: [FilterGroup; 7] = [
        Self::Age,
        Self::Course,
        Self::EnrolmentLength,
        Self::Ethnicity,
        Self::Gender,
        Self::Status,
        Self::Tutor,
    ];
}

impl fmt::Display for FilterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Age => "Age",
            Self::Course => "Course",
            Self::EnrolmentLength => "Enrolment Length",
            Self::Ethnicity => "Ethnicity",
            Self::Gender => "Gender",
            Self::Status => "Status",
            Self::Tutor => "Tutor",
        };
        f.write_str(name)
    }
}

/// Match on a text column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueFilter {
    Is(String),
    IsNot(String),
    AnyOf(Vec<String>),
}

impl ValueFilter {
    pub fn keeps(&self, value: Option<&str>) -> bool {
        let value = match value.map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => return false,
        };
        match self {
            Self::Is(target) => value == target,
            Self::IsNot(target) => value != target,
            Self::AnyOf(targets) => targets.iter().any(|t| t == value),
        }
    }

    /// `Value`, `!Value` or `A|B|C`
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if let Some(target) = text.strip_prefix('!') {
            return Ok(Self::IsNot(required_value(target)?));
        }
        if text.contains('|') {
            let targets = text
                .split('|')
                .map(required_value)
                .collect::<Result<Vec<String>>>()?;
            return Ok(Self::AnyOf(targets));
        }
        Ok(Self::Is(required_value(text)?))
    }
}

impl fmt::Display for ValueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Is(target) => write!(f, "is {}", target),
            Self::IsNot(target) => write!(f, "is not {}", target),
            Self::AnyOf(targets) => write!(f, "is one of {}", targets.join(", ")),
        }
    }
}

fn required_value(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        Err(Error::InvalidInput("filter value is blank".to_string()))
    } else {
        Ok(text.to_string())
    }
}

/// Bound on enrolment length in days, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthBound {
    AtMost(i64),
    AtLeast(i64),
    Between(i64, i64),
}

impl LengthBound {
    pub fn contains(&self, days: i64) -> bool {
        match *self {
            Self::AtMost(max) => days <= max,
            Self::AtLeast(min) => days >= min,
            Self::Between(min, max) => (min..=max).contains(&days),
        }
    }
}

impl fmt::Display for LengthBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtMost(max) => write!(f, "at most {} days", max),
            Self::AtLeast(min) => write!(f, "at least {} days", min),
            Self::Between(min, max) => write!(f, "between {} and {} days", min, max),
        }
    }
}

/// Course filter: interior substring of the code, or one exact code
#[derive(Debug, Clone)]
pub struct CoursePattern {
    target: String,
    interior: Option<Regex>,
}

impl CoursePattern {
    /// Codes with `fragment` strictly inside them (`.+ON.+`)
    pub fn interior(fragment: &str) -> Result<Self> {
        let fragment = required_value(fragment)?;
        let regex = Regex::new(&format!(".+{}.+", regex::escape(&fragment)))
            .map_err(|e| Error::InvalidInput(format!("course pattern '{}': {}", fragment, e)))?;
        Ok(Self {
            target: fragment,
            interior: Some(regex),
        })
    }

    /// Exactly the course `code`
    pub fn exact(code: &str) -> Result<Self> {
        Ok(Self {
            target: required_value(code)?,
            interior: None,
        })
    }

    pub fn matches(&self, course: &str) -> bool {
        let course = course.trim();
        match &self.interior {
            Some(regex) => regex.is_match(course),
            None => course == self.target,
        }
    }
}

impl PartialEq for CoursePattern {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target && self.interior.is_some() == other.interior.is_some()
    }
}

impl fmt::Display for CoursePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interior {
            Some(_) => write!(f, "contains {}", self.target),
            None => write!(f, "is {}", self.target),
        }
    }
}

/// One row predicate
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    Age { lower: i64, upper: i64 },
    Course(CoursePattern),
    EnrolLength(LengthBound),
    Ethnicity(ValueFilter),
    /// Keep (`true`) or drop (`false`) Pacific Island students
    Pacific { keep: bool },
    Gender(ValueFilter),
    Status(ValueFilter),
    Tutor(ValueFilter),
}

impl RowFilter {
    /// Age range, inclusive
    pub fn age(lower: i64, upper: i64) -> Result<Self> {
        if lower > upper {
            return Err(Error::InvalidInput(format!(
                "age range {}-{} has lower above upper",
                lower, upper
            )));
        }
        Ok(Self::Age { lower, upper })
    }

    pub fn enrol_length(bound: LengthBound) -> Result<Self> {
        if let LengthBound::Between(min, max) = bound {
            if min > max {
                return Err(Error::InvalidInput(format!(
                    "enrolment length range {}..{} has lower above upper",
                    min, max
                )));
            }
        }
        Ok(Self::EnrolLength(bound))
    }

    pub fn group(&self) -> FilterGroup {
        match self {
            Self::Age { .. } => FilterGroup::Age,
            Self::Course(_) => FilterGroup::Course,
            Self::EnrolLength(_) => FilterGroup::EnrolmentLength,
            Self::Ethnicity(_) | Self::Pacific { .. } => FilterGroup::Ethnicity,
            Self::Gender(_) => FilterGroup::Gender,
            Self::Status(_) => FilterGroup::Status,
            Self::Tutor(_) => FilterGroup::Tutor,
        }
    }

    /// Whether `row` survives this filter
    pub fn keeps<C: LedgerCell>(&self, row: &AnalysisRow<C>) -> bool {
        let d = &row.demographics;
        match self {
            Self::Age { lower, upper } => d.age.is_some_and(|age| (*lower..=*upper).contains(&age)),
            Self::Course(pattern) => pattern.matches(&row.identity().course),
            Self::EnrolLength(bound) => d.enrol_length.is_some_and(|days| bound.contains(days)),
            Self::Ethnicity(values) => values.keeps(d.ethnicity.as_deref()),
            Self::Pacific { keep } => d.pacific.is_some_and(|pacific| pacific == *keep),
            Self::Gender(values) => values.keeps(d.gender.as_deref()),
            Self::Status(values) => values.keeps(d.status.as_deref()),
            Self::Tutor(values) => values.keeps(d.tutor.as_deref()),
        }
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Age { lower, upper } => write!(f, "Age {}-{}", lower, upper),
            Self::Course(pattern) => write!(f, "Course {}", pattern),
            Self::EnrolLength(bound) => write!(f, "Enrolment length {}", bound),
            Self::Ethnicity(values) => write!(f, "Ethnicity {}", values),
            Self::Pacific { keep: true } => f.write_str("Pacific Island students"),
            Self::Pacific { keep: false } => f.write_str("Non-Pacific Island students"),
            Self::Gender(values) => write!(f, "Gender {}", values),
            Self::Status(values) => write!(f, "Status {}", values),
            Self::Tutor(values) => write!(f, "Tutor {}", values),
        }
    }
}

impl FromStr for RowFilter {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let (kind, args) = text.split_once(':').ok_or_else(|| {
            Error::InvalidInput(format!("filter '{}' is not of the form kind:args", text))
        })?;
        let args = args.trim();

        match kind.trim().to_lowercase().as_str() {
            "age" => {
                let (lower, upper) = match args.strip_suffix('+') {
                    Some(lower) => (parse_number(lower)?, AGE_BANDS[AGE_BANDS.len() - 1].1),
                    None => {
                        let (lower, upper) = args.split_once('-').ok_or_else(|| {
                            Error::InvalidInput(format!("age range '{}' is not lower-upper", args))
                        })?;
                        (parse_number(lower)?, parse_number(upper)?)
                    }
                };
                Self::age(lower, upper)
            }
            "course" => CoursePattern::interior(args).map(Self::Course),
            "course-code" => CoursePattern::exact(args).map(Self::Course),
            "enrol" => {
                let (min, max) = args.split_once("..").ok_or_else(|| {
                    Error::InvalidInput(format!("enrolment length '{}' is not min..max", args))
                })?;
                let bound = match (min.trim(), max.trim()) {
                    ("", "") => {
                        return Err(Error::InvalidInput(
                            "enrolment length needs a lower or upper bound".to_string(),
                        ))
                    }
                    ("", max) => LengthBound::AtMost(parse_number(max)?),
                    (min, "") => LengthBound::AtLeast(parse_number(min)?),
                    (min, max) => LengthBound::Between(parse_number(min)?, parse_number(max)?),
                };
                Self::enrol_length(bound)
            }
            "ethnicity" => ValueFilter::parse(args).map(Self::Ethnicity),
            "pacific" => match args.to_lowercase().as_str() {
                "yes" | "y" => Ok(Self::Pacific { keep: true }),
                "no" | "n" => Ok(Self::Pacific { keep: false }),
                other => Err(Error::InvalidInput(format!(
                    "pacific filter expects yes or no, got '{}'",
                    other
                ))),
            },
            "gender" => ValueFilter::parse(args).map(Self::Gender),
            "status" => ValueFilter::parse(args).map(Self::Status),
            "tutor" => ValueFilter::parse(args).map(Self::Tutor),
            other => Err(Error::InvalidInput(format!("unknown filter kind '{}'", other))),
        }
    }
}

fn parse_number(text: &str) -> Result<i64> {
    text.trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("'{}' is not a whole number", text.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Demographics;
    use asa_common::EnrolmentIdentity;
    use asa_ledger::{CompletionCell, StudentRecord};

    fn row(course: &str, demographics: Demographics) -> AnalysisRow<CompletionCell> {
        AnalysisRow {
            record: StudentRecord::with_cells(
                EnrolmentIdentity {
                    enrollment_id: "E1".to_string(),
                    student_id: "S1".to_string(),
                    name: "Ana Smith".to_string(),
                    course: course.to_string(),
                },
                vec![CompletionCell::Empty],
            ),
            demographics,
        }
    }

    fn aged(age: Option<i64>) -> AnalysisRow<CompletionCell> {
        row(
            "ADV-ON-001",
            Demographics {
                age,
                ..Demographics::default()
            },
        )
    }

    #[test]
    fn test_age_range_inclusive_and_missing_dropped() {
        let filter = RowFilter::age(18, 24).unwrap();
        assert!(filter.keeps(&aged(Some(18))));
        assert!(filter.keeps(&aged(Some(24))));
        assert!(!filter.keeps(&aged(Some(25))));
        assert!(!filter.keeps(&aged(None)));
        assert!(RowFilter::age(30, 20).is_err());
    }

    #[test]
    fn test_course_interior_pattern() {
        let online = CoursePattern::interior("ON").unwrap();
        assert!(online.matches("ADV-ON-001"));
        // Fragment must be strictly inside the code
        assert!(!online.matches("ON-001"));
        assert!(!online.matches("ADV-PT-001"));

        let exact = CoursePattern::exact("ADV-ON-001").unwrap();
        assert!(exact.matches("ADV-ON-001"));
        assert!(!exact.matches("ADV-ON-0012"));
    }

    #[test]
    fn test_course_pattern_escapes_fragment() {
        let pattern = CoursePattern::interior(".").unwrap();
        assert!(pattern.matches("A.B"));
        assert!(!pattern.matches("ABC"));
    }

    #[test]
    fn test_enrol_length_bounds() {
        let at_most = RowFilter::enrol_length(LengthBound::AtMost(90)).unwrap();
        let between = RowFilter::enrol_length(LengthBound::Between(30, 90)).unwrap();
        let days = |n: Option<i64>| {
            row(
                "X",
                Demographics {
                    enrol_length: n,
                    ..Demographics::default()
                },
            )
        };
        assert!(at_most.keeps(&days(Some(90))));
        assert!(!at_most.keeps(&days(Some(91))));
        assert!(!at_most.keeps(&days(None)));
        assert!(between.keeps(&days(Some(30))));
        assert!(!between.keeps(&days(Some(29))));
        assert!(RowFilter::enrol_length(LengthBound::Between(90, 30)).is_err());
    }

    #[test]
    fn test_value_filters() {
        let status = |s: &str| {
            row(
                "X",
                Demographics {
                    status: Some(s.to_string()),
                    ..Demographics::default()
                },
            )
        };
        let non_active = RowFilter::Status(ValueFilter::IsNot("Active".to_string()));
        assert!(non_active.keeps(&status("Expired")));
        assert!(!non_active.keeps(&status("Active")));
        assert!(!non_active.keeps(&row("X", Demographics::default())));

        let any = RowFilter::Status(ValueFilter::parse("Active|Suspended").unwrap());
        assert!(any.keeps(&status("Suspended")));
        assert!(!any.keeps(&status("Withdrawn")));
    }

    #[test]
    fn test_pacific_keep_and_drop() {
        let pacific = |p: Option<bool>| {
            row(
                "X",
                Demographics {
                    pacific: p,
                    ..Demographics::default()
                },
            )
        };
        let keep = RowFilter::Pacific { keep: true };
        let drop = RowFilter::Pacific { keep: false };
        assert!(keep.keeps(&pacific(Some(true))));
        assert!(!keep.keeps(&pacific(Some(false))));
        assert!(drop.keeps(&pacific(Some(false))));
        assert!(!drop.keeps(&pacific(None)));
    }

    #[test]
    fn test_parse_filter_arguments() {
        assert_eq!("age:18-24".parse::<RowFilter>().unwrap(), RowFilter::Age { lower: 18, upper: 24 });
        assert_eq!("age:65+".parse::<RowFilter>().unwrap(), RowFilter::Age { lower: 65, upper: 120 });
        assert_eq!(
            "enrol:..90".parse::<RowFilter>().unwrap(),
            RowFilter::EnrolLength(LengthBound::AtMost(90))
        );
        assert_eq!(
            "enrol:30..".parse::<RowFilter>().unwrap(),
            RowFilter::EnrolLength(LengthBound::AtLeast(30))
        );
        assert_eq!(
            "status:!Active".parse::<RowFilter>().unwrap(),
            RowFilter::Status(ValueFilter::IsNot("Active".to_string()))
        );
        assert_eq!(
            "tutor: Jane Doe | Sam Lee".parse::<RowFilter>().unwrap(),
            RowFilter::Tutor(ValueFilter::AnyOf(vec!["Jane Doe".to_string(), "Sam Lee".to_string()]))
        );
        assert_eq!(
            "pacific:no".parse::<RowFilter>().unwrap(),
            RowFilter::Pacific { keep: false }
        );
        assert_eq!(
            "course:PT".parse::<RowFilter>().unwrap().to_string(),
            "Course contains PT"
        );
        assert_eq!(
            "course-code:ADV-PT-006".parse::<RowFilter>().unwrap().to_string(),
            "Course is ADV-PT-006"
        );
    }

    #[test]
    fn test_parse_rejects_malformed_filters() {
        for text in ["age", "age:24-18", "age:x-3", "enrol:..", "height:3", "gender:", "status:A||B"] {
            assert!(text.parse::<RowFilter>().is_err(), "{}", text);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(RowFilter::Age { lower: 65, upper: 120 }.to_string(), "Age 65-120");
        assert_eq!(
            RowFilter::Ethnicity(ValueFilter::Is("Maori".to_string())).to_string(),
            "Ethnicity is Maori"
        );
        assert_eq!(
            RowFilter::EnrolLength(LengthBound::Between(30, 90)).to_string(),
            "Enrolment length between 30 and 90 days"
        );
        assert_eq!(RowFilter::Pacific { keep: true }.group(), FilterGroup::Ethnicity);
    }
}
