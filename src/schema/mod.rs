//! Schema system - field table, rules, validation pipeline and export

pub mod export;
pub mod fields;
pub mod formats;
pub mod rules;
pub mod validator;

pub use export::json_schema;
pub use fields::{Constraint, FieldKind, FieldSpec, FieldValue};
pub use rules::{FieldRule, RecordRule};
pub use validator::{FailurePolicy, Validator};
