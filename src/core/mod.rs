//! Core module - configuration, coercion and the error taxonomy

pub mod coerce;
pub mod config;
pub mod error;

pub use config::{ConfigError, UnknownFieldPolicy, ValidatorConfig};
pub use error::{ErrorCategory, ErrorKind, ValidationError, Violation};
