//! Interactive filter menu
//!
//! Drives the filter pipeline from a terminal with `dialoguer` prompts: asks
//! whether to add a filter, which group and option, then any values or
//! ranges; finally asks whether to keep the accepted filters. Esc at a
//! selection or `quit` typed at a text prompt aborts the run.
//!
//! The option tables and the mapping from answers to filters are plain
//! functions so they can be checked without a terminal.

use crate::filter::{
    CoursePattern, FilterGroup, LengthBound, RowFilter, ValueFilter, AGE_BANDS, COURSE_FAMILIES,
};
use crate::pipeline::{FilterDriver, TrialOutcome};
use asa_common::{Error, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

const QUIT: &str = "quit";
const NO_FURTHER: &str = "No further filter";
const CANCEL: &str = "No filter (cancel)";

/// What picking a menu option leads to
#[derive(Debug, Clone, PartialEq)]
pub enum Choice {
    /// The option is a complete filter
    Filter(RowFilter),
    /// The option needs an answer first
    Ask(Question),
    /// "No further filter": back to the first question
    Back,
}

/// Follow-up questions for options that need values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Question {
    AgeRange,
    CourseCode,
    MaxDays,
    MinDays,
    DayRange,
    Ethnicity,
    Ethnicities,
    Statuses,
    Tutor,
    Tutors,
}

/// A typed answer to a [`Question`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Number(i64),
    Range(i64, i64),
    Text(String),
    Values(Vec<String>),
}

impl Question {
    /// Prompt shown for the question (ranges ask "lower" then "upper")
    pub fn prompt(self) -> &'static str {
        match self {
            Self::AgeRange => "age",
            Self::DayRange => "number of days",
            Self::CourseCode => "What is the course code?",
            Self::MaxDays => "What is the maximum number of days?",
            Self::MinDays => "What is the minimum number of days?",
            Self::Ethnicity => "What is the ethnicity?",
            Self::Ethnicities => "Enter the ethnicities, separated by commas",
            Self::Statuses => "Enter the statuses, separated by commas",
            Self::Tutor => "What is the tutor's name?",
            Self::Tutors => "Enter the tutors' names, separated by commas",
        }
    }

    /// Build the filter from a matching answer
    pub fn filter(self, answer: Answer) -> Result<RowFilter> {
        match (self, answer) {
            (Self::AgeRange, Answer::Range(lower, upper)) => RowFilter::age(lower, upper),
            (Self::DayRange, Answer::Range(min, max)) => {
                RowFilter::enrol_length(LengthBound::Between(min, max))
            }
            (Self::MaxDays, Answer::Number(max)) => RowFilter::enrol_length(LengthBound::AtMost(max)),
            (Self::MinDays, Answer::Number(min)) => RowFilter::enrol_length(LengthBound::AtLeast(min)),
            (Self::CourseCode, Answer::Text(code)) => Ok(RowFilter::Course(CoursePattern::exact(&code)?)),
            (Self::Ethnicity, Answer::Text(value)) => Ok(RowFilter::Ethnicity(ValueFilter::Is(value))),
            (Self::Tutor, Answer::Text(value)) => Ok(RowFilter::Tutor(ValueFilter::Is(value))),
            (Self::Ethnicities, Answer::Values(values)) => {
                Ok(RowFilter::Ethnicity(ValueFilter::AnyOf(values)))
            }
            (Self::Statuses, Answer::Values(values)) => Ok(RowFilter::Status(ValueFilter::AnyOf(values))),
            (Self::Tutors, Answer::Values(values)) => Ok(RowFilter::Tutor(ValueFilter::AnyOf(values))),
            (question, answer) => Err(Error::InvalidInput(format!(
                "{:?} cannot be answered with {:?}",
                question, answer
            ))),
        }
    }
}

/// Menu entries for a group, ending in "No further filter"
pub fn options(group: FilterGroup) -> Vec<String> {
    let mut options: Vec<String> = match group {
        FilterGroup::Age => {
            let mut options: Vec<String> = AGE_BANDS
                .iter()
                .map(|(lower, upper)| format!("Students aged {}-{}", lower, upper))
                .collect();
            options.push("Specific age range".to_string());
            options
        }
        FilterGroup::Course => {
            let mut options: Vec<String> = COURSE_FAMILIES
                .iter()
                .map(|(name, _)| format!("{} students", name))
                .collect();
            options.push("Specific course students".to_string());
            options
        }
        FilterGroup::EnrolmentLength => owned(&[
            "No more than x days enrolled",
            "No less than x days enrolled",
            "Between x and y days enrolled",
        ]),
        FilterGroup::Ethnicity => owned(&[
            "Maori students",
            "Pacific Island students",
            "Non-Pacific Island students",
            "Specific ethnicity students",
            "Filter on multiple ethnicities",
        ]),
        FilterGroup::Gender => owned(&["Female students", "Male students"]),
        FilterGroup::Status => owned(&[
            "Active students",
            "Non-active students",
            "Expired students",
            "Graduated students",
            "Suspended students",
            "Withdrawn students",
            "Filter on multiple statuses",
        ]),
        FilterGroup::Tutor => owned(&["Specific tutor", "Filter on multiple tutors"]),
    };
    options.push(NO_FURTHER.to_string());
    options
}

/// What the option at `index` of [`options`] for `group` leads to
pub fn choice(group: FilterGroup, index: usize) -> Result<Choice> {
    let is = |value: &str| ValueFilter::Is(value.to_string());
    let choice = match group {
        FilterGroup::Age => match AGE_BANDS.get(index) {
            Some((lower, upper)) => Choice::Filter(RowFilter::age(*lower, *upper)?),
            None if index == AGE_BANDS.len() => Choice::Ask(Question::AgeRange),
            None => Choice::Back,
        },
        FilterGroup::Course => match COURSE_FAMILIES.get(index) {
            Some((_, fragment)) => Choice::Filter(RowFilter::Course(CoursePattern::interior(fragment)?)),
            None if index == COURSE_FAMILIES.len() => Choice::Ask(Question::CourseCode),
            None => Choice::Back,
        },
        FilterGroup::EnrolmentLength => match index {
            0 => Choice::Ask(Question::MaxDays),
            1 => Choice::Ask(Question::MinDays),
            2 => Choice::Ask(Question::DayRange),
            _ => Choice::Back,
        },
        FilterGroup::Ethnicity => match index {
            0 => Choice::Filter(RowFilter::Ethnicity(is("Maori"))),
            1 => Choice::Filter(RowFilter::Pacific { keep: true }),
            2 => Choice::Filter(RowFilter::Pacific { keep: false }),
            3 => Choice::Ask(Question::Ethnicity),
            4 => Choice::Ask(Question::Ethnicities),
            _ => Choice::Back,
        },
        FilterGroup::Gender => match index {
            0 => Choice::Filter(RowFilter::Gender(is("Female"))),
            1 => Choice::Filter(RowFilter::Gender(is("Male"))),
            _ => Choice::Back,
        },
        FilterGroup::Status => match index {
            0 => Choice::Filter(RowFilter::Status(is("Active"))),
            1 => Choice::Filter(RowFilter::Status(ValueFilter::IsNot("Active".to_string()))),
            2 => Choice::Filter(RowFilter::Status(is("Expired"))),
            3 => Choice::Filter(RowFilter::Status(is("Graduated"))),
            4 => Choice::Filter(RowFilter::Status(is("Suspended"))),
            5 => Choice::Filter(RowFilter::Status(is("Withdrawn"))),
            6 => Choice::Ask(Question::Statuses),
            _ => Choice::Back,
        },
        FilterGroup::Tutor => match index {
            0 => Choice::Ask(Question::Tutor),
            1 => Choice::Ask(Question::Tutors),
            _ => Choice::Back,
        },
    };
    Ok(choice)
}

fn owned(options: &[&str]) -> Vec<String> {
    options.iter().map(|o| o.to_string()).collect()
}

fn is_quit(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(QUIT)
}

/// Whole number entry, or `quit`
fn check_number(text: &str) -> std::result::Result<(), String> {
    if is_quit(text) || text.trim().parse::<i64>().is_ok() {
        Ok(())
    } else {
        Err("Please enter a whole number".to_string())
    }
}

/// Comma-separated values, blanks dropped
fn split_values(text: &str) -> Vec<String> {
    text.split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn prompt_error(e: dialoguer::Error) -> Error {
    match e {
        dialoguer::Error::IO(e) => Error::Io(e),
    }
}

/// Terminal menu
pub struct Menu {
    theme: ColorfulTheme,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_opt()
            .map_err(prompt_error)?
            .ok_or(Error::Aborted)
    }

    fn select(&self, prompt: &str, items: &[String]) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()
            .map_err(prompt_error)?
            .ok_or(Error::Aborted)
    }

    fn text(&self, prompt: &str) -> Result<String> {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .validate_with(|input: &String| -> std::result::Result<(), &'static str> {
                if input.trim().is_empty() {
                    Err("A value is required")
                } else {
                    Ok(())
                }
            })
            .interact_text()
            .map_err(prompt_error)?;
        if is_quit(&answer) {
            return Err(Error::Aborted);
        }
        Ok(answer.trim().to_string())
    }

    fn values(&self, prompt: &str) -> Result<Vec<String>> {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .validate_with(|input: &String| -> std::result::Result<(), &'static str> {
                if split_values(input).is_empty() {
                    Err("Enter at least one value, separated by commas")
                } else {
                    Ok(())
                }
            })
            .interact_text()
            .map_err(prompt_error)?;
        if is_quit(&answer) {
            return Err(Error::Aborted);
        }
        Ok(split_values(&answer))
    }

    /// Whole number no smaller than `at_least`
    fn number(&self, prompt: &str, at_least: Option<i64>) -> Result<i64> {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .validate_with(move |input: &String| -> std::result::Result<(), String> {
                check_number(input)?;
                match (at_least, input.trim().parse::<i64>()) {
                    (Some(lower), Ok(n)) if n < lower => {
                        Err(format!("Must not be below the lower value ({})", lower))
                    }
                    _ => Ok(()),
                }
            })
            .interact_text()
            .map_err(prompt_error)?;
        if is_quit(&answer) {
            return Err(Error::Aborted);
        }
        answer
            .trim()
            .parse()
            .map_err(|_| Error::InvalidInput(format!("'{}' is not a whole number", answer)))
    }

    fn answer(&self, question: Question) -> Result<Answer> {
        let answer = match question {
            Question::AgeRange | Question::DayRange => {
                let what = question.prompt();
                let lower = self.number(&format!("What is the lower {} value?", what), None)?;
                let upper =
                    self.number(&format!("What is the upper {} value?", what), Some(lower))?;
                Answer::Range(lower, upper)
            }
            Question::MaxDays | Question::MinDays => Answer::Number(self.number(question.prompt(), None)?),
            Question::CourseCode | Question::Ethnicity | Question::Tutor => {
                Answer::Text(self.text(question.prompt())?)
            }
            Question::Ethnicities | Question::Statuses | Question::Tutors => {
                Answer::Values(self.values(question.prompt())?)
            }
        };
        Ok(answer)
    }

    fn show_filters(&self, heading: &str, filters: &[RowFilter]) {
        if filters.is_empty() {
            println!("\nNo filters are applied.");
            return;
        }
        println!("\n{}:", heading);
        for (i, filter) in filters.iter().enumerate() {
            println!("  {}. {}", i + 1, filter);
        }
    }
}

impl FilterDriver for Menu {
    fn next_filter(&mut self, accepted: &[RowFilter]) -> Result<Option<RowFilter>> {
        let mut groups: Vec<String> = FilterGroup::ALL.iter().map(|g| g.to_string()).collect();
        groups.push(CANCEL.to_string());

        loop {
            self.show_filters("Filters currently applied", accepted);
            let article = if accepted.is_empty() { "a" } else { "another" };
            if !self.confirm(&format!("Do you wish to add {} filter to the data?", article))? {
                return Ok(None);
            }

            let Some(&group) = FilterGroup::ALL.get(self.select("Filter group", &groups)?) else {
                continue;
            };
            let title = format!("Options for filtering ({})", group);
            let index = self.select(&title, &options(group))?;
            match choice(group, index)? {
                Choice::Filter(filter) => return Ok(Some(filter)),
                Choice::Ask(question) => {
                    let answer = self.answer(question)?;
                    return question.filter(answer).map(Some);
                }
                Choice::Back => continue,
            }
        }
    }

    fn filter_accepted(&mut self, filter: &RowFilter, outcome: TrialOutcome) {
        if let TrialOutcome::Accepted { completion, .. } = outcome {
            println!("Applied '{}': {} students remain.", filter, completion);
        }
    }

    fn filter_rejected(&mut self, filter: &RowFilter) {
        println!("'{}' would leave no students, so it has not been applied.", filter);
    }

    fn retain_filters(&mut self, accepted: &[RowFilter]) -> Result<bool> {
        self.show_filters("The following filters will be applied", accepted);
        self.confirm("Use these filters? (n reverts to the original data)")
    }
}
