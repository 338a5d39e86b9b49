//! Record validation pipeline with detailed error reporting
//!
//! Stages, in order:
//! 1. structural checks per field, in declaration order, then undeclared fields
//! 2. field rules (transforms and per-field business checks)
//! 3. record assembly, which derives `bmi`
//! 4. record rules

use serde_json::Value as JsonValue;

use crate::core::coerce;
use crate::core::config::{UnknownFieldPolicy, ValidatorConfig};
use crate::core::error::{ErrorKind, ValidationError, Violation};
use crate::document::{self, diagnostics::find_path_span, DocumentError};
use crate::entities::patient::PatientRecord;
use crate::schema::fields::{patient_fields, FieldSpec, FieldValues, DERIVED_FIELDS};
use crate::schema::rules::{FieldRule, RecordRule, FIELD_RULES, RECORD_RULES};

/// How many violations to gather before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort on the first violation
    #[default]
    FailFast,
    /// Report every structural and field-rule violation; record rules run only
    /// when every field is valid
    CollectAll,
}

/// Patient record validator with its field table and rules
pub struct Validator {
    config: ValidatorConfig,
    fields: Vec<FieldSpec>,
    field_rules: Vec<(&'static str, FieldRule)>,
    record_rules: Vec<(&'static str, RecordRule)>,
    policy: FailurePolicy,
}

/// Violations gathered under a policy
struct Collector {
    policy: FailurePolicy,
    violations: Vec<Violation>,
}

impl Collector {
    /// Record a violation; `Err` means stop now
    fn push(&mut self, violation: Violation) -> Result<(), Vec<Violation>> {
        tracing::trace!(field = violation.field(), kind = %violation.kind(), "violation");
        self.violations.push(violation);
        match self.policy {
            FailurePolicy::FailFast => Err(std::mem::take(&mut self.violations)),
            FailurePolicy::CollectAll => Ok(()),
        }
    }

    fn checkpoint(&mut self) -> Result<(), Vec<Violation>> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.violations))
        }
    }
}

impl Validator {
    /// Create a validator with the given configuration
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            fields: patient_fields(&config),
            field_rules: FIELD_RULES.to_vec(),
            record_rules: RECORD_RULES.to_vec(),
            config,
            policy: FailurePolicy::default(),
        }
    }

    /// Set the failure policy used by [`validate`](Self::validate) and the
    /// document methods
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Field table, in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate a raw mapping under the configured policy
    pub fn validate(&self, raw: &JsonValue) -> Result<PatientRecord, ValidationError> {
        self.run(raw, self.policy).map_err(ValidationError::new)
    }

    /// Validate a raw mapping, reporting every violation found
    pub fn validate_all(&self, raw: &JsonValue) -> Result<PatientRecord, ValidationError> {
        self.run(raw, FailurePolicy::CollectAll)
            .map_err(ValidationError::new)
    }

    /// Parse and validate YAML content; violations point into the source
    pub fn validate_yaml(&self, content: &str, filename: &str) -> Result<PatientRecord, DocumentError> {
        let raw = document::parse_yaml(content, filename)?;
        self.validate_document(&raw, content, filename)
    }

    /// Parse and validate JSON content; violations point into the source
    pub fn validate_json(&self, content: &str, filename: &str) -> Result<PatientRecord, DocumentError> {
        let raw = document::parse_json(content, filename)?;
        self.validate_document(&raw, content, filename)
    }

    fn validate_document(
        &self,
        raw: &JsonValue,
        content: &str,
        filename: &str,
    ) -> Result<PatientRecord, DocumentError> {
        self.validate(raw).map_err(|mut error| {
            for violation in error.violations_mut() {
                let span = find_path_span(content, violation.field());
                *violation = violation.clone().with_span(span);
            }
            DocumentError::Validation(error.with_source(filename, content))
        })
    }

    fn run(&self, raw: &JsonValue, policy: FailurePolicy) -> Result<PatientRecord, Vec<Violation>> {
        tracing::debug!(?policy, "validating patient record");
        let result = self.run_stages(raw, policy);
        match &result {
            Ok(record) => tracing::debug!(bmi = ?record.bmi(), "patient record valid"),
            Err(violations) => {
                tracing::debug!(count = violations.len(), "patient record rejected")
            }
        }
        result
    }

    fn run_stages(&self, raw: &JsonValue, policy: FailurePolicy) -> Result<PatientRecord, Vec<Violation>> {
        let mut collector = Collector {
            policy,
            violations: Vec::new(),
        };

        let Some(object) = raw.as_object() else {
            return Err(vec![Violation::new(
                ErrorKind::WrongType,
                "",
                format!(
                    "Input should be a mapping of field names to values, got {}",
                    coerce::type_name(raw)
                ),
            )]);
        };

        // 1. Structural checks
        tracing::trace!("structural checks");
        let mut values = FieldValues::default();
        for spec in &self.fields {
            match spec.check(object.get(spec.name)) {
                Ok(Some(value)) => values.insert(spec.name, value),
                Ok(None) => {}
                Err(violation) => collector.push(violation)?,
            }
        }

        for key in object.keys() {
            let declared = self.fields.iter().any(|spec| spec.name == key.as_str());
            if declared {
                continue;
            }
            if DERIVED_FIELDS.contains(&key.as_str()) {
                tracing::trace!(field = %key, "discarding derived field from input");
                continue;
            }
            match self.config.unknown_fields {
                UnknownFieldPolicy::Reject => collector.push(
                    Violation::new(ErrorKind::UnknownField, key.as_str(), "Extra inputs are not permitted")
                        .with_help(format!("Remove the '{}' field or check spelling", key)),
                )?,
                UnknownFieldPolicy::Ignore => {
                    tracing::warn!(field = %key, "ignoring unrecognized patient field")
                }
            }
        }

        // 2. Field rules, on fields that passed their structural checks
        tracing::trace!("field rules");
        for (name, rule) in &self.field_rules {
            if let Some(value) = values.take(name) {
                match rule(value, &self.config) {
                    Ok(kept) => values.insert(*name, kept),
                    Err(violation) => collector.push(violation)?,
                }
            }
        }
        collector.checkpoint()?;

        // 3. Assembly
        let record = PatientRecord::assemble(values).map_err(|violation| vec![violation])?;

        // 4. Record rules
        tracing::trace!("record rules");
        for (name, rule) in &self.record_rules {
            if let Err(violation) = rule(&record, &self.config) {
                tracing::trace!(rule = *name, "record rule failed");
                collector.push(violation)?;
            }
        }
        collector.checkpoint()?;

        Ok(record)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}
