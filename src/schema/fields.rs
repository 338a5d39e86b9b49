//! Declarative field table for the patient record
//!
//! Each [`FieldSpec`] names a field, its raw type and the constraints checked
//! against it in isolation. The table is built from a [`ValidatorConfig`] so
//! configurable bounds land in the same place as the fixed ones, and the same
//! table drives both structural validation and JSON Schema export.

use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;

use crate::core::coerce;
use crate::core::config::ValidatorConfig;
use crate::core::error::{ErrorKind, Violation};
use crate::schema::formats;

/// Choices accepted for `married`
pub const MARITAL_CHOICES: &[&str] = &["yes", "no"];

/// Fields computed by the record; accepted in input and discarded
pub const DERIVED_FIELDS: &[&str] = &["bmi"];

/// Raw type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Email,
    Url,
    TextList,
    TextMap,
}

/// A constraint checked against one field's coerced value
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Inclusive character-count bounds
    Length { min: usize, max: usize },
    /// Inclusive lower bound
    Minimum(f64),
    /// Inclusive upper bound
    Maximum(f64),
    /// Exclusive lower bound
    ExclusiveMinimum(f64),
    /// Upper bound on sequence length
    MaxItems(usize),
    /// Upper bound on each sequence item's character count
    ItemMaxLength(usize),
    /// Closed set of accepted strings
    OneOf(&'static [&'static str]),
}

/// A coerced, structurally valid field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i128),
    Decimal(f64),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

/// Declaration of one record field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub constraints: Vec<Constraint>,
    pub description: &'static str,
    pub example: JsonValue,
}

impl FieldSpec {
    fn new(name: &'static str, kind: FieldKind, required: bool) -> Self {
        Self {
            name,
            kind,
            required,
            constraints: Vec::new(),
            description: "",
            example: JsonValue::Null,
        }
    }

    fn constrained(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    fn described(mut self, description: &'static str, example: JsonValue) -> Self {
        self.description = description;
        self.example = example;
        self
    }

    /// Coerce and check the raw value for this field
    ///
    /// `Ok(None)` means the field is optional and was absent (or `null`).
    pub fn check(&self, raw: Option<&JsonValue>) -> Result<Option<FieldValue>, Violation> {
        let raw = match raw {
            None | Some(JsonValue::Null) if !self.required => return Ok(None),
            None => {
                return Err(Violation::new(
                    ErrorKind::MissingRequiredField,
                    self.name,
                    "Field required",
                )
                .with_help(format!("Add the '{}' field", self.name)))
            }
            Some(raw) => raw,
        };

        let value = match self.kind {
            FieldKind::Text => FieldValue::Text(coerce::text(self.name, raw)?),
            FieldKind::Integer => FieldValue::Integer(coerce::integer(self.name, raw)?),
            FieldKind::Decimal => FieldValue::Decimal(coerce::decimal(self.name, raw)?),
            FieldKind::Email => {
                let email = coerce::text(self.name, raw)?;
                if let Some(problem) = formats::email_problem(&email) {
                    return Err(Violation::new(
                        ErrorKind::MalformedEmail,
                        self.name,
                        format!("value is not a valid email address: {}", problem),
                    ));
                }
                FieldValue::Text(email)
            }
            FieldKind::Url => {
                let url = coerce::text(self.name, raw)?;
                if !formats::is_url(&url) {
                    return Err(Violation::new(
                        ErrorKind::MalformedUrl,
                        self.name,
                        "Input should be a valid URL",
                    )
                    .with_help("Use an absolute URL such as https://example.com"));
                }
                FieldValue::Text(url)
            }
            FieldKind::TextList => FieldValue::List(coerce::text_list(self.name, raw)?),
            FieldKind::TextMap => FieldValue::Map(coerce::text_map(self.name, raw)?),
        };

        for constraint in &self.constraints {
            apply(self.name, constraint, &value)?;
        }
        Ok(Some(value))
    }
}

fn apply(field: &str, constraint: &Constraint, value: &FieldValue) -> Result<(), Violation> {
    match (constraint, value) {
        (Constraint::Length { min, max }, FieldValue::Text(s)) => {
            let len = s.chars().count();
            if len < *min {
                return Err(Violation::new(
                    ErrorKind::LengthViolation,
                    field,
                    format!("String should have at least {} characters", min),
                ));
            }
            if len > *max {
                return Err(Violation::new(
                    ErrorKind::LengthViolation,
                    field,
                    format!("String should have at most {} characters", max),
                ));
            }
        }
        (Constraint::Minimum(limit), _) => {
            if numeric(value).is_some_and(|n| n < *limit) {
                return Err(Violation::new(
                    ErrorKind::OutOfRange,
                    field,
                    format!("Input should be greater than or equal to {}", limit),
                ));
            }
        }
        (Constraint::Maximum(limit), _) => {
            if numeric(value).is_some_and(|n| n > *limit) {
                return Err(Violation::new(
                    ErrorKind::OutOfRange,
                    field,
                    format!("Input should be less than or equal to {}", limit),
                ));
            }
        }
        (Constraint::ExclusiveMinimum(limit), _) => {
            if numeric(value).is_some_and(|n| n <= *limit) {
                return Err(Violation::new(
                    ErrorKind::OutOfRange,
                    field,
                    format!("Input should be greater than {}", limit),
                ));
            }
        }
        (Constraint::MaxItems(max), FieldValue::List(items)) => {
            if items.len() > *max {
                return Err(Violation::new(
                    ErrorKind::LengthViolation,
                    field,
                    format!(
                        "List should have at most {} items after validation, not {}",
                        max,
                        items.len()
                    ),
                ));
            }
        }
        (Constraint::ItemMaxLength(max), FieldValue::List(items)) => {
            if let Some(i) = items.iter().position(|item| item.chars().count() > *max) {
                return Err(Violation::new(
                    ErrorKind::LengthViolation,
                    format!("{}.{}", field, i),
                    format!("String should have at most {} characters", max),
                ));
            }
        }
        (Constraint::OneOf(choices), FieldValue::Text(s)) => {
            if !choices.contains(&s.as_str()) {
                let quoted: Vec<String> = choices.iter().map(|c| format!("'{}'", c)).collect();
                return Err(Violation::new(
                    ErrorKind::InvalidEnumValue,
                    field,
                    format!("Input should be {}", quoted.join(" or ")),
                )
                .with_help(format!("Valid values: {}", choices.join(", "))));
            }
        }
        // Constraint does not apply to this value shape
        _ => {}
    }
    Ok(())
}

fn numeric(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Integer(i) => Some(*i as f64),
        FieldValue::Decimal(d) => Some(*d),
        _ => None,
    }
}

/// The patient record's fields, in declaration order
pub fn patient_fields(config: &ValidatorConfig) -> Vec<FieldSpec> {
    let (name_min, name_max) = config.name_length_bounds;
    vec![
        FieldSpec::new("name", FieldKind::Text, true)
            .constrained(Constraint::Length {
                min: name_min,
                max: name_max,
            })
            .described("Full name of the patient", json!("John Doe")),
        FieldSpec::new("age", FieldKind::Integer, true)
            .constrained(Constraint::Minimum(0.0))
            .constrained(Constraint::Maximum(f64::from(u32::MAX)))
            .described("Age of the patient", json!(30)),
        FieldSpec::new("weight", FieldKind::Decimal, false)
            .constrained(Constraint::ExclusiveMinimum(0.0))
            .described("Weight of the patient in kg", json!(70.5)),
        FieldSpec::new("height", FieldKind::Decimal, false)
            .constrained(Constraint::ExclusiveMinimum(0.0))
            .described("Height of the patient in cm", json!(175.0)),
        FieldSpec::new("email", FieldKind::Email, true)
            .described("Email address of the patient", json!("john.doe@hdfc.com")),
        FieldSpec::new("website", FieldKind::Url, false)
            .described("Website URL of the patient", json!("https://johndoe.com")),
        FieldSpec::new("married", FieldKind::Text, false)
            .constrained(Constraint::OneOf(MARITAL_CHOICES))
            .described("Marital status of the patient", json!("no")),
        FieldSpec::new("allergies", FieldKind::TextList, false)
            .constrained(Constraint::MaxItems(config.max_allergies))
            .constrained(Constraint::ItemMaxLength(config.allergy_max_length))
            .described(
                "List of allergies the patient has",
                json!(["Peanuts", "Penicillin"]),
            ),
        FieldSpec::new("contact_details", FieldKind::TextMap, true).described(
            "A mapping of contact details like phone number and address",
            json!({"phone": "123-456-7890", "address": "123 Main St"}),
        ),
    ]
}

/// Structurally valid values keyed by field name
#[derive(Debug, Default)]
pub struct FieldValues {
    values: BTreeMap<&'static str, FieldValue>,
}

impl FieldValues {
    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.values.insert(name, value);
    }

    pub fn take(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn take_text(&mut self, name: &str) -> Option<String> {
        match self.take(name)? {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn take_integer(&mut self, name: &str) -> Option<i128> {
        match self.take(name)? {
            FieldValue::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn take_decimal(&mut self, name: &str) -> Option<f64> {
        match self.take(name)? {
            FieldValue::Decimal(d) => Some(d),
            _ => None,
        }
    }

    pub fn take_list(&mut self, name: &str) -> Option<Vec<String>> {
        match self.take(name)? {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn take_map(&mut self, name: &str) -> Option<BTreeMap<String, String>> {
        match self.take(name)? {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }
}
