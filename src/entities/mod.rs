//! Entity type definitions
//!
//! - [`PatientRecord`] - demographic and health data with a derived BMI

pub mod patient;

pub use patient::{MaritalStatus, PatientRecord};
