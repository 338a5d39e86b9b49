//! Custom validators run after the structural pass
//!
//! Field rules receive a structurally valid value and return the value the
//! record keeps; a rule that accepts its input must hand it back. Record rules
//! see the assembled record and either accept it or report a violation.

use crate::core::config::ValidatorConfig;
use crate::core::error::{ErrorKind, Violation};
use crate::entities::patient::{PatientRecord, EMERGENCY_CONTACT_KEY};
use crate::schema::fields::FieldValue;

/// Per-field validator: candidate in, kept value out
pub type FieldRule = fn(FieldValue, &ValidatorConfig) -> Result<FieldValue, Violation>;

/// Whole-record validator
pub type RecordRule = fn(&PatientRecord, &ValidatorConfig) -> Result<(), Violation>;

/// Field rules keyed by field name, in field declaration order
pub const FIELD_RULES: &[(&str, FieldRule)] = &[
    ("name", uppercase_name as FieldRule),
    ("email", allowed_email_domain as FieldRule),
];

/// Record rules, run once every field is valid
pub const RECORD_RULES: &[(&str, RecordRule)] =
    &[("emergency_contact", emergency_contact_for_seniors as RecordRule)];

/// Store names upper-cased
pub fn uppercase_name(value: FieldValue, _config: &ValidatorConfig) -> Result<FieldValue, Violation> {
    match value {
        FieldValue::Text(name) => Ok(FieldValue::Text(name.to_uppercase())),
        other => Ok(other),
    }
}

/// Domain after the last `@` must be allow-listed; the kept address has a
/// lower-cased domain
pub fn allowed_email_domain(
    value: FieldValue,
    config: &ValidatorConfig,
) -> Result<FieldValue, Violation> {
    let email = match value {
        FieldValue::Text(email) => email,
        other => return Ok(other),
    };
    let (local, domain) = email.rsplit_once('@').unwrap_or(("", email.as_str()));

    if !config.is_allowed_domain(domain) {
        let listed: Vec<String> = config
            .allowed_email_domains
            .iter()
            .map(|d| format!("'{}'", d))
            .collect();
        return Err(Violation::new(
            ErrorKind::InvalidDomain,
            "email",
            format!("Email domain must be one of [{}]", listed.join(", ")),
        )
        .with_help(format!(
            "'{}' is not an accepted domain; use an address at {}",
            domain,
            config.allowed_email_domains.join(" or ")
        )));
    }

    Ok(FieldValue::Text(format!("{}@{}", local, domain.to_lowercase())))
}

/// Patients past the configured age must have an emergency contact on file
pub fn emergency_contact_for_seniors(
    record: &PatientRecord,
    config: &ValidatorConfig,
) -> Result<(), Violation> {
    if record.age() > config.emergency_contact_age
        && !record.contact_details().contains_key(EMERGENCY_CONTACT_KEY)
    {
        return Err(Violation::new(
            ErrorKind::MissingEmergencyContact,
            "contact_details",
            "Emergency contact must be provided in contact_details",
        )
        .with_help(format!(
            "Patients older than {} need an '{}' entry in contact_details",
            config.emergency_contact_age, EMERGENCY_CONTACT_KEY
        )));
    }
    Ok(())
}
