//! Patient record: a validated demographic and health record
//!
//! Raw input (a mapping of field name to value, or a YAML/JSON document) goes
//! through a fixed pipeline: structural checks with lax coercion, field rules,
//! record assembly with a derived BMI, then whole-record rules. The result is
//! an immutable [`PatientRecord`] or a [`ValidationError`] listing what broke.
//!
//! ```
//! use patient_record::PatientRecord;
//! use serde_json::json;
//!
//! let record = PatientRecord::validate(&json!({
//!     "name": "John Doe",
//!     "age": 80,
//!     "email": "john.doe@hdfc.com",
//!     "contact_details": {"emergency_contact": "Jane Doe"},
//!     "weight": 80,
//!     "height": 175
//! }))
//! .unwrap();
//!
//! assert_eq!(record.name(), "JOHN DOE");
//! assert_eq!(record.bmi(), Some(26.12));
//! ```

pub mod core;
pub mod document;
pub mod entities;
pub mod schema;

pub use crate::core::{
    ConfigError, ErrorCategory, ErrorKind, UnknownFieldPolicy, ValidationError, ValidatorConfig,
    Violation,
};
pub use document::DocumentError;
pub use entities::{MaritalStatus, PatientRecord};
pub use schema::{FailurePolicy, Validator};
