//! Patient record entity type

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

use crate::core::error::{ErrorKind, ValidationError, Violation};
use crate::document::DocumentError;
use crate::schema::fields::FieldValues;
use crate::schema::Validator;

/// Contact detail key required for patients past the emergency-contact age
pub const EMERGENCY_CONTACT_KEY: &str = "emergency_contact";

/// Marital status
///
/// Input accepts only `yes` or `no`; [`MaritalStatus::NotSpecified`] is the
/// value an omitted field takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    Yes,
    No,
    /// Omitted or `null` on input; never accepted as an explicit value
    #[default]
    #[serde(rename = "Not specified")]
    NotSpecified,
}

impl MaritalStatus {
    pub fn is_not_specified(&self) -> bool {
        *self == MaritalStatus::NotSpecified
    }
}

impl fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaritalStatus::Yes => write!(f, "yes"),
            MaritalStatus::No => write!(f, "no"),
            MaritalStatus::NotSpecified => write!(f, "Not specified"),
        }
    }
}

/// A validated patient record
///
/// Only obtainable through validation: construct with
/// [`PatientRecord::validate`], a [`Validator`], or by deserializing (which
/// runs the same pipeline). Fields are read-only after construction and
/// `bmi` is derived from `weight` and `height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonValue")]
pub struct PatientRecord {
    /// Full name, upper-cased
    name: String,

    /// Age in years
    age: u32,

    /// Weight in kg
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,

    /// Height in cm
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<f64>,

    email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    website: Option<String>,

    /// Omitted from serialized output when not specified, since input only
    /// accepts yes/no
    #[serde(skip_serializing_if = "MaritalStatus::is_not_specified")]
    married: MaritalStatus,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    allergies: Vec<String>,

    contact_details: BTreeMap<String, String>,

    /// Body mass index, derived
    #[serde(skip_serializing_if = "Option::is_none")]
    bmi: Option<f64>,
}

impl PatientRecord {
    /// Validate raw input with the default configuration
    pub fn validate(raw: &JsonValue) -> Result<Self, ValidationError> {
        Validator::default().validate(raw)
    }

    /// Parse and validate a YAML document with the default configuration
    pub fn from_yaml_str(content: &str) -> Result<Self, DocumentError> {
        Validator::default().validate_yaml(content, "patient.yaml")
    }

    /// Parse and validate a JSON document with the default configuration
    pub fn from_json_str(content: &str) -> Result<Self, DocumentError> {
        Validator::default().validate_json(content, "patient.json")
    }

    /// Build the record from structurally valid, rule-checked values
    pub(crate) fn assemble(mut values: FieldValues) -> Result<Self, Violation> {
        let name = required(values.take_text("name"), "name")?;
        let age = required(values.take_integer("age"), "age")?;
        let age = u32::try_from(age).map_err(|_| {
            Violation::new(
                ErrorKind::OutOfRange,
                "age",
                format!("Input should be between 0 and {}", u32::MAX),
            )
        })?;
        let weight = values.take_decimal("weight");
        let height = values.take_decimal("height");
        let email = required(values.take_text("email"), "email")?;
        let website = values.take_text("website");
        let married = match values.take_text("married").as_deref() {
            Some("yes") => MaritalStatus::Yes,
            Some("no") => MaritalStatus::No,
            _ => MaritalStatus::NotSpecified,
        };
        let allergies = values.take_list("allergies").unwrap_or_default();
        let contact_details = required(values.take_map("contact_details"), "contact_details")?;

        Ok(Self {
            name,
            age,
            weight,
            height,
            email,
            website,
            married,
            allergies,
            contact_details,
            bmi: body_mass_index(weight, height),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn weight(&self) -> Option<f64> {
        self.weight
    }

    pub fn height(&self) -> Option<f64> {
        self.height
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Domain part of the email address
    pub fn email_domain(&self) -> &str {
        self.email
            .rsplit_once('@')
            .map_or(self.email.as_str(), |(_, domain)| domain)
    }

    pub fn website(&self) -> Option<&str> {
        self.website.as_deref()
    }

    pub fn married(&self) -> MaritalStatus {
        self.married
    }

    pub fn allergies(&self) -> &[String] {
        &self.allergies
    }

    pub fn contact_details(&self) -> &BTreeMap<String, String> {
        &self.contact_details
    }

    pub fn emergency_contact(&self) -> Option<&str> {
        self.contact_details
            .get(EMERGENCY_CONTACT_KEY)
            .map(String::as_str)
    }

    /// Body mass index, present iff both weight and height are
    pub fn bmi(&self) -> Option<f64> {
        self.bmi
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, Violation> {
    value.ok_or_else(|| Violation::new(ErrorKind::MissingRequiredField, field, "Field required"))
}

/// weight (kg) / height (m)², rounded to two decimal places; height is in cm
pub fn body_mass_index(weight: Option<f64>, height: Option<f64>) -> Option<f64> {
    let (weight, height) = (weight?, height?);
    let meters = height / 100.0;
    Some(round2(weight / (meters * meters)))
}

/// Rounds the exact decimal value of `value` half-to-even at two places
fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

impl TryFrom<JsonValue> for PatientRecord {
    type Error = ValidationError;

    fn try_from(raw: JsonValue) -> Result<Self, Self::Error> {
        Self::validate(&raw)
    }
}

impl std::str::FromStr for PatientRecord {
    type Err = DocumentError;

    /// Parses YAML, which also covers JSON documents
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_yaml_str(s)
    }
}

fn or_none<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

impl fmt::Display for PatientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Patient Name: {}", self.name)?;
        writeln!(f, "Patient Age: {}", self.age)?;
        writeln!(f, "Patient Email: {}", self.email)?;
        writeln!(f, "Patient Website: {}", or_none(self.website.as_deref()))?;
        writeln!(f, "Patient Married: {}", self.married)?;
        writeln!(f, "Patient Contact Details:")?;
        for (key, value) in &self.contact_details {
            writeln!(f, "  {}: {}", key, value)?;
        }
        write!(f, "Patient BMI: {}", or_none(self.bmi))
    }
}
