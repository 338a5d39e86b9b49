//! Integration tests for patient record validation
//!
//! These tests exercise the public API end-to-end: raw mappings, YAML and
//! JSON documents, configuration files and the exported JSON Schema.

use miette::Diagnostic;
use patient_record::{
    DocumentError, ErrorCategory, ErrorKind, FailurePolicy, MaritalStatus, PatientRecord,
    ValidatorConfig, Validator,
};
use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};
use std::io::Write;

/// The reference patient: valid, over 60, with an emergency contact
fn john_doe() -> JsonValue {
    json!({
        "name": "John Doe",
        "age": 80,
        "email": "john.doe@hdfc.com",
        "website": "https://johndoe.com",
        "contact_details": {"phone": "123-456-7890", "emergency_contact": "Jane Doe"},
        "weight": 80,
        "height": 175
    })
}

/// A minimal valid patient with the given overrides applied
fn patient_with(overrides: JsonValue) -> JsonValue {
    let mut raw = json!({
        "name": "Asha Rao",
        "age": 34,
        "email": "asha@axis.com",
        "contact_details": {"phone": "555-0100"}
    });
    if let (Some(base), Some(extra)) = (raw.as_object_mut(), overrides.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    raw
}

fn error_kind(raw: &JsonValue) -> ErrorKind {
    PatientRecord::validate(raw)
        .expect_err("record should be rejected")
        .kind()
        .expect("at least one violation")
}

// ============================================================================
// Reference Scenarios
// ============================================================================

#[test]
fn test_reference_patient_is_valid() {
    let record = PatientRecord::validate(&john_doe()).unwrap();

    assert_eq!(record.name(), "JOHN DOE");
    assert_eq!(record.age(), 80);
    assert_eq!(record.bmi(), Some(26.12));
    assert_eq!(record.married(), MaritalStatus::NotSpecified);
    assert_eq!(record.married().to_string(), "Not specified");
    assert_eq!(record.email(), "john.doe@hdfc.com");
    assert_eq!(record.website(), Some("https://johndoe.com"));
    assert!(record.allergies().is_empty());
}

#[test]
fn test_reference_patient_without_emergency_contact() {
    let mut raw = john_doe();
    raw["contact_details"] = json!({"phone": "123-456-7890"});

    let err = PatientRecord::validate(&raw).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::MissingEmergencyContact));
    assert_eq!(err.violations()[0].category(), ErrorCategory::Semantic);
}

#[test]
fn test_gmail_address_rejected() {
    let raw = patient_with(json!({"email": "a@gmail.com"}));
    assert_eq!(error_kind(&raw), ErrorKind::InvalidDomain);
}

#[test]
fn test_negative_age_rejected() {
    let raw = patient_with(json!({"age": -1}));
    assert_eq!(error_kind(&raw), ErrorKind::OutOfRange);
}

#[test]
fn test_display_routine() {
    let record = PatientRecord::validate(&john_doe()).unwrap();
    insta::assert_snapshot!(record.to_string(), @r"
    Patient Name: JOHN DOE
    Patient Age: 80
    Patient Email: john.doe@hdfc.com
    Patient Website: https://johndoe.com
    Patient Married: Not specified
    Patient Contact Details:
      emergency_contact: Jane Doe
      phone: 123-456-7890
    Patient BMI: 26.12
    ");
}

// ============================================================================
// Field Constraints
// ============================================================================

#[test]
fn test_each_error_kind_is_reachable() {
    let cases = [
        (json!({"name": "A"}), ErrorKind::LengthViolation),
        (json!({"weight": 0}), ErrorKind::OutOfRange),
        (json!({"height": -170}), ErrorKind::OutOfRange),
        (json!({"email": "asha.axis.com"}), ErrorKind::MalformedEmail),
        (json!({"website": "asha dot com"}), ErrorKind::MalformedUrl),
        (json!({"married": "single"}), ErrorKind::InvalidEnumValue),
        (json!({"allergies": "Peanuts"}), ErrorKind::WrongType),
        (json!({"contact_details": {"phone": 5550100}}), ErrorKind::WrongType),
        (json!({"nickname": "Ash"}), ErrorKind::UnknownField),
        (json!({"age": 61}), ErrorKind::MissingEmergencyContact),
    ];

    for (overrides, expected) in cases {
        let raw = patient_with(overrides.clone());
        assert_eq!(error_kind(&raw), expected, "overrides: {}", overrides);
    }
}

#[test]
fn test_lax_coercion() {
    let raw = patient_with(json!({"age": "34", "weight": "61.5", "height": 160}));
    let record = PatientRecord::validate(&raw).unwrap();
    assert_eq!(record.age(), 34);
    assert_eq!(record.weight(), Some(61.5));
    assert_eq!(record.height(), Some(160.0));
    assert_eq!(record.bmi(), Some(24.02));
}

#[test]
fn test_null_optionals_take_defaults() {
    let raw = patient_with(json!({
        "weight": null,
        "website": null,
        "married": null,
        "allergies": null
    }));
    let record = PatientRecord::validate(&raw).unwrap();
    assert_eq!(record.weight(), None);
    assert_eq!(record.website(), None);
    assert_eq!(record.married(), MaritalStatus::NotSpecified);
    assert!(record.allergies().is_empty());
    assert_eq!(record.bmi(), None);
}

#[test]
fn test_explicit_marital_status() {
    let record = PatientRecord::validate(&patient_with(json!({"married": "yes"}))).unwrap();
    assert_eq!(record.married(), MaritalStatus::Yes);
}

#[test]
fn test_allergies_kept_in_order() {
    let raw = patient_with(json!({"allergies": ["Peanuts", "Penicillin", "Latex"]}));
    let record = PatientRecord::validate(&raw).unwrap();
    assert_eq!(record.allergies(), ["Peanuts", "Penicillin", "Latex"]);
}

#[test]
fn test_collect_all_policy() {
    let raw = json!({"name": "A", "age": -3, "email": "nobody", "contact_details": []});
    let validator = Validator::default().with_policy(FailurePolicy::CollectAll);
    let err = validator.validate(&raw).unwrap_err();

    assert_eq!(err.violation_count(), 4);
    assert!(err
        .violations()
        .iter()
        .all(|v| v.category() == ErrorCategory::Structural));
    assert_eq!(err.to_string(), "Patient record validation failed: 4 errors");
}

#[test]
fn test_error_diagnostic_code() {
    let err = PatientRecord::validate(&patient_with(json!({"age": -1}))).unwrap_err();
    let code = err.code().map(|c| c.to_string());
    assert_eq!(code.as_deref(), Some("patient::validation_error"));
}

// ============================================================================
// Documents
// ============================================================================

#[test]
fn test_yaml_document() {
    let yaml = r#"
name: John Doe
age: 80
email: john.doe@hdfc.com
website: https://johndoe.com
weight: 80
height: 175
contact_details:
  phone: "123-456-7890"
  emergency_contact: Jane Doe
"#;
    let record = PatientRecord::from_yaml_str(yaml).unwrap();
    assert_eq!(record.name(), "JOHN DOE");
    assert_eq!(record.bmi(), Some(26.12));
}

#[test]
fn test_yaml_document_violation_points_at_key() {
    let yaml = "name: John Doe\nage: 80\nemail: john.doe@gmail.com\ncontact_details:\n  emergency_contact: Jane\n";
    let err = PatientRecord::from_yaml_str(yaml).unwrap_err();

    let validation = err.as_validation().expect("parsed fine, failed validation");
    let violation = &validation.violations()[0];
    assert_eq!(violation.kind(), ErrorKind::InvalidDomain);
    assert_eq!(
        violation.span().map(|s| s.offset()),
        yaml.find("email:")
    );
}

#[test]
fn test_json_document_syntax_error() {
    let err = PatientRecord::from_json_str("{\"name\": \"John\",}").unwrap_err();
    assert!(matches!(err, DocumentError::Syntax(_)));
    assert!(err.to_string().starts_with("JSON syntax error"));
}

#[test]
fn test_serialized_record_reloads() {
    let record = PatientRecord::validate(&john_doe()).unwrap();
    let json = serde_json::to_string(&record).unwrap();
    let reloaded = PatientRecord::from_json_str(&json).unwrap();
    assert_eq!(record, reloaded);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_changes_rules() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "allowed_email_domains: [clinic.org]\nmax_allergies: 1\nemergency_contact_age: 70"
    )
    .unwrap();

    let config = ValidatorConfig::from_yaml_file(file.path()).unwrap();
    let validator = Validator::new(config);

    let raw = patient_with(json!({"email": "asha@clinic.org", "age": 65}));
    assert!(validator.validate(&raw).is_ok());

    let raw = patient_with(json!({"email": "asha@clinic.org", "allergies": ["a", "b"]}));
    assert_eq!(
        validator.validate(&raw).unwrap_err().kind(),
        Some(ErrorKind::LengthViolation)
    );

    let raw = patient_with(json!({"email": "asha@clinic.org", "age": 71}));
    assert_eq!(
        validator.validate(&raw).unwrap_err().kind(),
        Some(ErrorKind::MissingEmergencyContact)
    );
}

#[test]
fn test_validator_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Validator>();

    let validator = std::sync::Arc::new(Validator::default());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let validator = std::sync::Arc::clone(&validator);
            std::thread::spawn(move || {
                let raw = patient_with(json!({"age": 20 + i}));
                validator.validate(&raw).is_ok()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

// ============================================================================
// JSON Schema Export
// ============================================================================

#[test]
fn test_exported_schema_accepts_reference_patient() {
    let schema = patient_record::schema::json_schema(&ValidatorConfig::default());
    let validator = jsonschema::validator_for(&schema).unwrap();

    assert!(validator.is_valid(&john_doe()));

    let dumped = serde_json::to_value(PatientRecord::validate(&john_doe()).unwrap()).unwrap();
    assert!(validator.is_valid(&dumped));
}

#[test]
fn test_exported_schema_rejects_structural_errors() {
    let schema = patient_record::schema::json_schema(&ValidatorConfig::default());
    let validator = jsonschema::validator_for(&schema).unwrap();

    assert!(!validator.is_valid(&patient_with(json!({"age": -1}))));
    assert!(!validator.is_valid(&patient_with(json!({"name": "A"}))));
    assert!(!validator.is_valid(&patient_with(json!({"married": "maybe"}))));
    assert!(!validator.is_valid(&patient_with(json!({"unexpected": 1}))));
    assert!(!validator.is_valid(&json!({"name": "Asha Rao", "age": 30})));
}

#[test]
fn test_bmi_rounds_ties_to_even() {
    let cases = [(104.5, 26.12), (299.7, 74.92)];
    for (weight, expected) in cases {
        let raw = patient_with(json!({"weight": weight, "height": 200}));
        let record = PatientRecord::validate(&raw).unwrap();
        assert_eq!(record.bmi(), Some(expected), "weight {}", weight);
    }
}

#[test]
fn test_violation_codes_name_kind() {
    let err = PatientRecord::validate(&patient_with(json!({"age": -1}))).unwrap_err();
    let code = err.violations()[0].code().map(|c| c.to_string());
    assert_eq!(code.as_deref(), Some("patient::validation::out_of_range"));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Absent weight or height means no BMI
    #[test]
    fn prop_bmi_absent_without_both(
        weight in proptest::option::of(1.0f64..300.0),
        height in proptest::option::of(50.0f64..250.0),
    ) {
        prop_assume!(weight.is_none() || height.is_none());
        let raw = patient_with(json!({"weight": weight, "height": height}));
        let record = PatientRecord::validate(&raw).unwrap();
        prop_assert_eq!(record.bmi(), None);
    }

    /// BMI is weight / (height in m)², rounded to two places
    #[test]
    fn prop_bmi_formula(weight in 1.0f64..300.0, height in 50.0f64..250.0) {
        let raw = patient_with(json!({"weight": weight, "height": height}));
        let record = PatientRecord::validate(&raw).unwrap();
        let meters = height / 100.0;
        let exact = weight / (meters * meters);
        let bmi = record.bmi().unwrap();
        prop_assert!((bmi - exact).abs() <= 0.005 + 1e-9, "bmi {} from {}", bmi, exact);
        prop_assert_eq!(format!("{:.2}", bmi), format!("{:.2}", exact));
    }

    /// Names are stored upper-cased
    #[test]
    fn prop_name_upper_cased(name in "[A-Za-z][A-Za-z .'-]{1,49}") {
        let record = PatientRecord::validate(&patient_with(json!({"name": name.clone()}))).unwrap();
        prop_assert_eq!(record.name(), name.to_uppercase());
    }

    /// Over 60 without an emergency contact always fails
    #[test]
    fn prop_seniors_need_emergency_contact(age in 61u32..=130) {
        let raw = patient_with(json!({"age": age}));
        prop_assert_eq!(error_kind(&raw), ErrorKind::MissingEmergencyContact);
    }

    /// Syntactically valid addresses outside the allow-list always fail
    #[test]
    fn prop_unlisted_domains_rejected(local in "[a-z]{1,12}", domain in "[a-z]{3,10}\\.(com|org|net|in)") {
        prop_assume!(domain != "hdfc.com" && domain != "axis.com");
        let raw = patient_with(json!({"email": format!("{}@{}", local, domain)}));
        prop_assert_eq!(error_kind(&raw), ErrorKind::InvalidDomain);
    }

    /// More than five allergies always fails
    #[test]
    fn prop_too_many_allergies(allergies in proptest::collection::vec("[a-z]{1,20}", 6..12)) {
        let raw = patient_with(json!({"allergies": allergies}));
        prop_assert_eq!(error_kind(&raw), ErrorKind::LengthViolation);
    }

    /// Any allergy entry over 100 characters fails
    #[test]
    fn prop_long_allergy_entry(extra in 1usize..50, position in 0usize..5) {
        let mut allergies = vec!["Peanuts".to_string(); 5];
        allergies[position] = "x".repeat(100 + extra);
        let raw = patient_with(json!({"allergies": allergies}));
        let err = PatientRecord::validate(&raw).unwrap_err();
        prop_assert_eq!(err.kind(), Some(ErrorKind::LengthViolation));
        prop_assert_eq!(err.violations()[0].field(), format!("allergies.{}", position));
    }
}
