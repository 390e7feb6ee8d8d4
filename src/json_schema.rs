//! JSON Schema export
//!
//! Renders a record type as a draft-07 JSON Schema document, the form
//! generic tooling (and the viewer's form builder) understands.

use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Map, Value};

use crate::error::{Result, SchemaError};
use crate::schema::{FieldDef, FieldType, RecordType};

pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Build the JSON Schema document for a record type
pub fn to_json_schema(record_type: &RecordType) -> Value {
    let mut properties = Map::new();
    for field in &record_type.fields {
        properties.insert(field.name.clone(), property(field));
    }

    let required: Vec<&str> = record_type
        .required_fields()
        .map(|f| f.name.as_str())
        .collect();

    let mut schema = json!({
        "$schema": DRAFT_07,
        "title": record_type.name,
        "type": "object",
        "properties": properties,
        "required": required,
    });
    if !record_type.description.is_empty() {
        schema["description"] = json!(record_type.description);
    }
    schema
}

fn property(field: &FieldDef) -> Value {
    let base_type = match field.field_type {
        FieldType::String | FieldType::Email => "string",
        FieldType::Int => "integer",
        FieldType::Float => "number",
        FieldType::Bool => "boolean",
    };

    let mut prop = Map::new();
    if field.is_nullable() {
        prop.insert("type".into(), json!([base_type, "null"]));
    } else {
        prop.insert("type".into(), json!(base_type));
    }
    if field.field_type == FieldType::Email {
        prop.insert("format".into(), json!("email"));
    }
    if let Some(default) = &field.default {
        prop.insert("default".into(), default.clone());
    }

    let c = &field.constraints;
    if let Some(min) = &c.min {
        prop.insert("minimum".into(), Value::Number(min.clone()));
    }
    if let Some(max) = &c.max {
        prop.insert("maximum".into(), Value::Number(max.clone()));
    }
    if let Some(min_length) = c.min_length {
        prop.insert("minLength".into(), json!(min_length));
    }
    if let Some(max_length) = c.max_length {
        prop.insert("maxLength".into(), json!(max_length));
    }
    if let Some(choices) = &c.choices {
        let mut allowed = choices.clone();
        if field.is_nullable() {
            allowed.push(Value::Null);
        }
        prop.insert("enum".into(), Value::Array(allowed));
    }
    if !field.description.is_empty() {
        prop.insert("description".into(), json!(field.description));
    }

    Value::Object(prop)
}

/// Compile the export of `record_type`, failing if it is not a usable schema
pub fn compile(record_type: &RecordType) -> Result<JSONSchema> {
    let schema = to_json_schema(record_type);
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .map_err(|e| {
            SchemaError::InvalidDefinition(format!(
                "{} does not export to a valid JSON Schema: {}",
                record_type.name, e
            ))
        })
}
