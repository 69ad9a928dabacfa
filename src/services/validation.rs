//! Ordered field validation and sanitization for submitted forms.
//!
//! A pipeline is a list of [`FieldRule`]s. Each rule reads one field of the
//! raw submission and applies its steps in order: sanitizers rewrite the
//! value, checks record a message when the current value fails. Every rule
//! runs, so one bad field never hides another.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateLength;

use crate::models::BookInstanceStatus;

/// Raw submitted field, either a single value or a repeated one.
///
/// `null` reads as an absent field; numbers and booleans read as their text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Absent,
    One(String),
    Many(Vec<String>),
    Number(serde_json::Number),
    Flag(bool),
}

impl FieldValue {
    fn into_values(self) -> Vec<String> {
        match self {
            FieldValue::Absent => Vec::new(),
            FieldValue::One(value) => vec![value],
            FieldValue::Many(values) => values,
            FieldValue::Number(number) => vec![number.to_string()],
            FieldValue::Flag(flag) => vec![flag.to_string()],
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::One(value.to_string())
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Untrusted field mapping as supplied by the caller
pub type RawForm = BTreeMap<String, FieldValue>;

/// Sanitized value of one field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SanitizedValue {
    Text(String),
    List(Vec<String>),
}

/// Sanitized value of every declared field, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SanitizedValues(IndexMap<&'static str, SanitizedValue>);

impl SanitizedValues {
    /// Single value of a field; empty when absent
    pub fn text(&self, field: &str) -> &str {
        match self.0.get(field) {
            Some(SanitizedValue::Text(value)) => value,
            Some(SanitizedValue::List(values)) => values.first().map(String::as_str).unwrap_or(""),
            None => "",
        }
    }

    /// All values of a field; a single value reads as one element
    pub fn list(&self, field: &str) -> Vec<&str> {
        match self.0.get(field) {
            Some(SanitizedValue::List(values)) => values.iter().map(String::as_str).collect(),
            Some(SanitizedValue::Text(value)) => vec![value.as_str()],
            None => Vec::new(),
        }
    }
}

/// One rejected field with its user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result of running a pipeline over one submission
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub values: SanitizedValues,
    pub errors: Vec<FieldError>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fields that failed, in order, without duplicates
    pub fn failed_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for error in &self.errors {
            if !fields.contains(&error.field.as_str()) {
                fields.push(&error.field);
            }
        }
        fields
    }
}

#[derive(Debug, Clone)]
enum Step {
    Trim,
    Escape,
    NotEmpty(&'static str),
    MaxLength(u64, &'static str),
    Alphanumeric(&'static str),
    IsoDate(&'static str),
    Uuid(&'static str),
    Status(&'static str),
}

impl Step {
    /// Apply the step to one value; checks return the message on failure
    fn apply(&self, value: &mut String) -> Option<&'static str> {
        match self {
            Step::Trim => {
                let trimmed = value.trim();
                if trimmed.len() != value.len() {
                    *value = trimmed.to_string();
                }
                None
            }
            Step::Escape => {
                *value = escape(value);
                None
            }
            Step::NotEmpty(message) => value.is_empty().then_some(*message),
            Step::MaxLength(max, message) => {
                (!value.validate_length(None, Some(*max), None)).then_some(*message)
            }
            Step::Alphanumeric(message) => {
                let valid = !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric());
                (!valid).then_some(*message)
            }
            Step::IsoDate(message) => parse_iso_date(value).is_none().then_some(*message),
            Step::Uuid(message) => Uuid::parse_str(value).is_err().then_some(*message),
            Step::Status(message) => value.parse::<BookInstanceStatus>().is_err().then_some(*message),
        }
    }
}

/// Rule over one named field
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: &'static str,
    multi: bool,
    optional: bool,
    steps: Vec<Step>,
}

impl FieldRule {
    /// Rule over a single-valued field
    pub fn single(field: &'static str) -> Self {
        Self {
            field,
            multi: false,
            optional: false,
            steps: Vec::new(),
        }
    }

    /// Rule over a multi-valued field; steps apply to every element
    pub fn list(field: &'static str) -> Self {
        Self {
            multi: true,
            ..Self::single(field)
        }
    }

    /// Skip every step when the value is empty
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn trim(self) -> Self {
        self.step(Step::Trim)
    }

    /// Replace markup-significant characters with HTML entities
    pub fn escape(self) -> Self {
        self.step(Step::Escape)
    }

    pub fn not_empty(self, message: &'static str) -> Self {
        self.step(Step::NotEmpty(message))
    }

    /// At most `max` characters
    pub fn max_length(self, max: u64, message: &'static str) -> Self {
        self.step(Step::MaxLength(max, message))
    }

    /// ASCII letters and digits only
    pub fn alphanumeric(self, message: &'static str) -> Self {
        self.step(Step::Alphanumeric(message))
    }

    pub fn iso_date(self, message: &'static str) -> Self {
        self.step(Step::IsoDate(message))
    }

    pub fn uuid(self, message: &'static str) -> Self {
        self.step(Step::Uuid(message))
    }

    /// One of the copy statuses
    pub fn status(self, message: &'static str) -> Self {
        self.step(Step::Status(message))
    }

    fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    fn run(&self, raw: Option<&FieldValue>, errors: &mut Vec<FieldError>) -> SanitizedValue {
        let values = raw.cloned().map(FieldValue::into_values).unwrap_or_default();

        if self.multi {
            let sanitized = values
                .into_iter()
                .map(|value| self.run_value(value, errors))
                .collect();
            SanitizedValue::List(sanitized)
        } else {
            let value = values.into_iter().next().unwrap_or_default();
            SanitizedValue::Text(self.run_value(value, errors))
        }
    }

    fn run_value(&self, mut value: String, errors: &mut Vec<FieldError>) -> String {
        if self.optional && value.is_empty() {
            return value;
        }
        for step in &self.steps {
            if let Some(message) = step.apply(&mut value) {
                errors.push(FieldError::new(self.field, message));
            }
        }
        value
    }
}

/// Named, ordered list of field rules
#[derive(Debug, Clone)]
pub struct ValidationPipeline {
    name: &'static str,
    rules: Vec<FieldRule>,
}

impl ValidationPipeline {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn run(&self, raw: &RawForm) -> ValidationOutcome {
        let mut values = IndexMap::with_capacity(self.rules.len());
        let mut errors = Vec::new();

        for rule in &self.rules {
            let value = rule.run(raw.get(rule.field), &mut errors);
            values.insert(rule.field, value);
        }

        if !errors.is_empty() {
            tracing::debug!(pipeline = self.name, failures = errors.len(), "submission rejected");
        }

        ValidationOutcome {
            values: SanitizedValues(values),
            errors,
        }
    }
}

/// HTML-escape `&`, `<`, `>`, quotes, slashes and backticks
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Parse an ISO-8601 calendar date or date-time, keeping the date part
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|datetime| datetime.date())
}

pub fn author_form() -> ValidationPipeline {
    ValidationPipeline::new("author_form")
        .rule(
            FieldRule::single("family_name")
                .trim()
                .not_empty("Family name must be specified.")
                .escape()
                .max_length(100, "Family name must be at most 100 characters.")
                .alphanumeric("Family name contains non-alphanumeric characters."),
        )
        .rule(
            FieldRule::single("first_name")
                .trim()
                .not_empty("First name must be specified.")
                .escape()
                .max_length(100, "First name must be at most 100 characters.")
                .alphanumeric("First name contains non-alphanumeric characters."),
        )
        .rule(
            FieldRule::single("date_of_birth")
                .optional()
                .iso_date("Invalid date of birth"),
        )
        .rule(
            FieldRule::single("date_of_death")
                .optional()
                .iso_date("Invalid date of death"),
        )
}

pub fn genre_form() -> ValidationPipeline {
    ValidationPipeline::new("genre_form").rule(
        FieldRule::single("name")
            .trim()
            .not_empty("Genre name required")
            .escape()
            .max_length(100, "Genre name must be at most 100 characters."),
    )
}

pub fn book_form() -> ValidationPipeline {
    ValidationPipeline::new("book_form")
        .rule(
            FieldRule::single("title")
                .trim()
                .not_empty("Book must have title")
                .escape(),
        )
        .rule(
            FieldRule::single("author")
                .trim()
                .not_empty("Author must not be empty.")
                .escape()
                .uuid("Invalid author"),
        )
        .rule(
            FieldRule::single("summary")
                .trim()
                .not_empty("Summary must not be empty.")
                .escape(),
        )
        .rule(
            FieldRule::single("isbn")
                .trim()
                .not_empty("ISBN must not be empty")
                .escape(),
        )
        .rule(FieldRule::list("genre").escape().uuid("Invalid genre"))
}

pub fn book_instance_form() -> ValidationPipeline {
    ValidationPipeline::new("bookinstance_form")
        .rule(
            FieldRule::single("book")
                .trim()
                .not_empty("Book must be specified")
                .escape()
                .uuid("Invalid book"),
        )
        .rule(
            FieldRule::single("imprint")
                .trim()
                .not_empty("Imprint must be specified")
                .escape(),
        )
        .rule(FieldRule::single("status").escape().status("Invalid status"))
        .rule(
            FieldRule::single("due_back")
                .optional()
                .iso_date("Invalid date"),
        )
}
