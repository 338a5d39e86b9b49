//! Validation error taxonomy with miette diagnostics

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use std::fmt;
use thiserror::Error;

/// Broad class of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Shape, type, bound or format problem with a single field
    Structural,
    /// Business rule failure
    Semantic,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Structural => write!(f, "structural"),
            ErrorCategory::Semantic => write!(f, "semantic"),
        }
    }
}

/// The rule a violation broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required field is absent
    MissingRequiredField,
    /// The value has a type that cannot be coerced into the field's type
    WrongType,
    /// The input carries a field the record does not declare
    UnknownField,
    /// A numeric value violates its bound
    OutOfRange,
    /// A string or sequence length is outside its bound
    LengthViolation,
    /// Email syntax check failed
    MalformedEmail,
    /// URL syntax check failed
    MalformedUrl,
    /// An enumerated field got a value outside its choices
    InvalidEnumValue,
    /// Email domain is not allow-listed
    InvalidDomain,
    /// Patient is past the emergency-contact age without one on file
    MissingEmergencyContact,
}

impl ErrorKind {
    /// Whether this kind is a shape problem or a business rule failure
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::InvalidDomain | ErrorKind::MissingEmergencyContact => {
                ErrorCategory::Semantic
            }
            _ => ErrorCategory::Structural,
        }
    }

    /// Stable snake_case identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingRequiredField => "missing_required_field",
            ErrorKind::WrongType => "wrong_type",
            ErrorKind::UnknownField => "unknown_field",
            ErrorKind::OutOfRange => "out_of_range",
            ErrorKind::LengthViolation => "length_violation",
            ErrorKind::MalformedEmail => "malformed_email",
            ErrorKind::MalformedUrl => "malformed_url",
            ErrorKind::InvalidEnumValue => "invalid_enum_value",
            ErrorKind::InvalidDomain => "invalid_domain",
            ErrorKind::MissingEmergencyContact => "missing_emergency_contact",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule violation, tied to a field path
///
/// The diagnostic code names the kind, e.g. `patient::validation::out_of_range`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {message}", display_path(.field))]
pub struct Violation {
    kind: ErrorKind,
    field: String,
    message: String,
    span: Option<SourceSpan>,
    help: Option<String>,
}

impl Diagnostic for Violation {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("patient::validation::{}", self.kind)))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|help| Box::new(help) as Box<dyn fmt::Display + 'a>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.kind.to_string()),
            span,
        ))))
    }
}

impl Violation {
    pub fn new(kind: ErrorKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
            span: None,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Dotted path of the offending field (`allergies.2`); empty for the document root
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Option<SourceSpan> {
        self.span
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

fn display_path(field: &str) -> String {
    if field.is_empty() {
        "document root".to_string()
    } else {
        field.to_string()
    }
}

/// Validation failure carrying every violation found
///
/// Under the fail-fast policy this holds exactly one violation. No partial
/// record ever accompanies it.
#[derive(Debug, Error, Diagnostic)]
#[error("Patient record validation failed: {summary}")]
#[diagnostic(code(patient::validation_error))]
pub struct ValidationError {
    summary: String,

    #[source_code]
    src: Option<NamedSource<String>>,

    #[related]
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        let summary = match violations.as_slice() {
            [only] => only.to_string(),
            many => format!("{} errors", many.len()),
        };
        Self {
            summary,
            src: None,
            violations,
        }
    }

    pub fn single(violation: Violation) -> Self {
        Self::new(vec![violation])
    }

    /// Attach the document the raw input was parsed from
    pub fn with_source(mut self, filename: &str, source: &str) -> Self {
        self.src = Some(NamedSource::new(filename, source.to_string()));
        self
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub(crate) fn violations_mut(&mut self) -> &mut [Violation] {
        &mut self.violations
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Kind of the first violation
    pub fn kind(&self) -> Option<ErrorKind> {
        self.violations.first().map(Violation::kind)
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}
