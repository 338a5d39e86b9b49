//! Document error diagnostics with source locations

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::core::error::ValidationError;

/// Syntax error in a raw YAML or JSON document
#[derive(Debug, Error, Diagnostic)]
#[error("{format} syntax error: {message}")]
#[diagnostic(code(patient::document::syntax))]
pub struct SyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    format: &'static str,

    /// The underlying parser message
    message: String,
}

impl SyntaxError {
    /// Create a syntax error from a serde_yml error
    pub fn from_yaml_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));
        Self::at_location("YAML", err.to_string(), source, filename, line, column)
    }

    /// Create a syntax error from a serde_json error
    pub fn from_json_error(err: &serde_json::Error, source: &str, filename: &str) -> Self {
        Self::at_location(
            "JSON",
            err.to_string(),
            source,
            filename,
            err.line().max(1),
            err.column().max(1),
        )
    }

    /// Create a syntax error at a specific 1-based line and column
    pub fn at_location(
        format: &'static str,
        message: impl Into<String>,
        source: &str,
        filename: &str,
        line: usize,
        column: usize,
    ) -> Self {
        let message = message.into();
        let offset = line_col_to_offset(source, line, column);
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            format,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}

/// Failure to turn a document into a patient record
#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),
}

impl DocumentError {
    /// The validation failure, if parsing succeeded
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            DocumentError::Validation(e) => Some(e),
            DocumentError::Syntax(_) => None,
        }
    }
}

/// Convert line/column to byte offset
pub(crate) fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    let mut current_line = 1;

    for (i, ch) in source.char_indices() {
        if current_line == line {
            // Find the column within this line
            let line_start = i;
            let mut col = 1;
            for (j, c) in source[line_start..].char_indices() {
                if col == column {
                    return line_start + j;
                }
                if c == '\n' {
                    break;
                }
                col += 1;
            }
            return line_start + column.saturating_sub(1);
        }
        if ch == '\n' {
            current_line += 1;
        }
        offset = i;
    }

    offset
}

/// Find the span of a dotted field path (`contact_details.phone`)
///
/// Looks for the deepest path segment that appears as a key, falling back to
/// its parents and finally to the first line.
pub(crate) fn find_path_span(content: &str, path: &str) -> SourceSpan {
    let parts: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();

    for key in parts.iter().rev() {
        // Sequence indices are not keys
        if key.parse::<usize>().is_ok() {
            continue;
        }
        if let Some(span) = find_key_span(content, key) {
            return span;
        }
    }

    let len = content.find('\n').unwrap_or(content.len()).max(1);
    (0, len).into()
}

/// Find the span of a key in YAML or JSON content
fn find_key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let yaml_key = format!("{}:", key);
    let json_key = format!("\"{}\"", key);

    let mut offset = 0;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(&yaml_key) || trimmed.starts_with(&json_key) {
            let key_start = offset + (line.len() - trimmed.len());
            return Some((key_start, trimmed.len()).into());
        }
        offset += line.len() + 1; // +1 for newline
    }

    // Single-line JSON
    content
        .find(&json_key)
        .map(|start| (start, json_key.len()).into())
}

/// Generate helpful suggestions based on error message
fn generate_help(message: &str) -> Option<String> {
    let msg_lower = message.to_lowercase();

    if msg_lower.contains("tab") {
        return Some(
            "YAML requires spaces for indentation, not tabs. Replace tabs with spaces.".to_string(),
        );
    }

    if msg_lower.contains("duplicate") {
        return Some("Each field can only appear once. Remove the duplicate key.".to_string());
    }

    if msg_lower.contains("expected block end") {
        return Some("Check your indentation - it may be inconsistent.".to_string());
    }

    if msg_lower.contains("mapping values are not allowed") {
        return Some("You may be missing a space after ':' or have incorrect indentation.".to_string());
    }

    if msg_lower.contains("trailing comma") {
        return Some("JSON does not allow a comma after the last entry.".to_string());
    }

    if msg_lower.contains("eof while parsing") {
        return Some("The document ends early - check for an unclosed '{' or '['.".to_string());
    }

    if msg_lower.contains("@") || msg_lower.contains("special character") {
        return Some("Values starting with @ need to be quoted: \"@value\"".to_string());
    }

    None
}
