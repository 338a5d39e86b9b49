//! Raw document parsing - YAML and JSON into the validator's input shape

pub mod diagnostics;

pub use diagnostics::{DocumentError, SyntaxError};

use serde_json::Value as JsonValue;

/// Parse YAML content into a raw JSON value
pub fn parse_yaml(content: &str, filename: &str) -> Result<JsonValue, SyntaxError> {
    let yaml_value: serde_yml::Value = serde_yml::from_str(content)
        .map_err(|e| SyntaxError::from_yaml_error(&e, content, filename))?;

    serde_json::to_value(&yaml_value).map_err(|e| {
        SyntaxError::at_location(
            "YAML",
            format!("Failed to convert YAML to JSON: {}", e),
            content,
            filename,
            1,
            1,
        )
    })
}

/// Parse JSON content into a raw JSON value
pub fn parse_json(content: &str, filename: &str) -> Result<JsonValue, SyntaxError> {
    serde_json::from_str(content).map_err(|e| SyntaxError::from_json_error(&e, content, filename))
}
