//! JSON Schema export of the patient record input shape

use serde_json::{json, Map, Value as JsonValue};

use crate::core::config::{UnknownFieldPolicy, ValidatorConfig};
use crate::schema::fields::{patient_fields, Constraint, FieldKind, FieldSpec};

/// JSON Schema (draft 2020-12) describing the raw input a validator accepts
///
/// Field rules and record rules are not expressible here; the schema covers
/// shapes, bounds and formats only.
pub fn json_schema(config: &ValidatorConfig) -> JsonValue {
    let fields = patient_fields(config);

    let mut properties = Map::new();
    for spec in &fields {
        properties.insert(spec.name.to_string(), field_schema(spec));
    }
    properties.insert(
        "bmi".to_string(),
        json!({
            "title": "Bmi",
            "description": "Body mass index derived from weight and height; ignored on input",
            "type": ["number", "null"],
            "readOnly": true
        }),
    );

    let required: Vec<&str> = fields
        .iter()
        .filter(|spec| spec.required)
        .map(|spec| spec.name)
        .collect();

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "PatientRecord",
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": config.unknown_fields == UnknownFieldPolicy::Ignore,
    })
}

fn field_schema(spec: &FieldSpec) -> JsonValue {
    let mut schema = Map::new();
    schema.insert("title".to_string(), json!(title_case(spec.name)));
    schema.insert("description".to_string(), json!(spec.description));
    if !spec.example.is_null() {
        schema.insert("examples".to_string(), json!([spec.example]));
    }

    let base = match spec.kind {
        FieldKind::Text => "string",
        FieldKind::Integer => "integer",
        FieldKind::Decimal => "number",
        FieldKind::Email | FieldKind::Url => "string",
        FieldKind::TextList => "array",
        FieldKind::TextMap => "object",
    };
    let is_enum = spec
        .constraints
        .iter()
        .any(|c| matches!(c, Constraint::OneOf(_)));
    if !is_enum {
        let ty = if spec.required {
            json!(base)
        } else {
            json!([base, "null"])
        };
        schema.insert("type".to_string(), ty);
    }

    match spec.kind {
        FieldKind::Email => {
            schema.insert("format".to_string(), json!("email"));
        }
        FieldKind::Url => {
            schema.insert("format".to_string(), json!("uri"));
        }
        FieldKind::TextList => {
            schema.insert("items".to_string(), json!({"type": "string"}));
            schema.insert("default".to_string(), json!([]));
        }
        FieldKind::TextMap => {
            schema.insert(
                "additionalProperties".to_string(),
                json!({"type": "string"}),
            );
        }
        _ => {}
    }

    for constraint in &spec.constraints {
        match constraint {
            Constraint::Length { min, max } => {
                schema.insert("minLength".to_string(), json!(min));
                schema.insert("maxLength".to_string(), json!(max));
            }
            Constraint::Minimum(limit) => {
                schema.insert("minimum".to_string(), json!(limit));
            }
            Constraint::Maximum(limit) => {
                schema.insert("maximum".to_string(), json!(limit));
            }
            Constraint::ExclusiveMinimum(limit) => {
                schema.insert("exclusiveMinimum".to_string(), json!(limit));
            }
            Constraint::MaxItems(max) => {
                schema.insert("maxItems".to_string(), json!(max));
            }
            Constraint::ItemMaxLength(max) => {
                schema.insert(
                    "items".to_string(),
                    json!({"type": "string", "maxLength": max}),
                );
            }
            Constraint::OneOf(choices) => {
                let mut options: Vec<JsonValue> = choices.iter().map(|c| json!(c)).collect();
                options.push(JsonValue::Null);
                schema.insert("enum".to_string(), JsonValue::Array(options));
                schema.insert("default".to_string(), json!("Not specified"));
            }
        }
    }

    JsonValue::Object(schema)
}

/// `contact_details` -> `Contact Details`
fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
