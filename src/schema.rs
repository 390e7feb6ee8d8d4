//! Record type and field definitions
//!
//! A [`RecordType`] is a named, ordered list of [`FieldDef`]s. Its lower-cased
//! name is the collection the viewer stores instances in.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Primitive type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// String holding an email address
    Email,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
}

impl FieldType {
    /// Returns the type name used on the wire and in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Email => "email",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
        }
    }

    /// Whether numeric range constraints apply
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float)
    }

    /// Whether length constraints apply
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Email)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Validation constraints on a single field
///
/// Numeric bounds are inclusive. Lengths count characters, not bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Enumerated allowed values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self == &Constraints::default()
    }

    pub fn min_value(&self) -> Option<f64> {
        self.min.as_ref().and_then(Number::as_f64)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.max.as_ref().and_then(Number::as_f64)
    }
}

/// A single field of a record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldDef")]
pub struct FieldDef {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Always the inverse of `default.is_some()`
    pub required: bool,

    /// `Some(Value::Null)` marks an optional field defaulting to null
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    pub constraints: Constraints,

    pub description: String,
}

impl FieldDef {
    /// Create a required field with no constraints
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            default: None,
            constraints: Constraints::default(),
            description: String::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Email)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Bool)
    }

    /// Make the field optional with a null default
    pub fn optional(self) -> Self {
        self.with_default(Value::Null)
    }

    /// Make the field optional with the given default
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self.required = false;
        self
    }

    pub fn min(mut self, min: impl Into<Number>) -> Self {
        self.constraints.min = Some(min.into());
        self
    }

    pub fn max(mut self, max: impl Into<Number>) -> Self {
        self.constraints.max = Some(max.into());
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.max_length = Some(len);
        self
    }

    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.constraints.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the field accepts an explicit null
    pub fn is_nullable(&self) -> bool {
        matches!(self.default, Some(Value::Null))
    }
}

/// Wire form of a field, as written in definition files
///
/// `required` may be omitted; it is derived from the presence of `default`.
/// An optional field without a default defaults to null.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFieldDef {
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default)]
    required: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    default: Option<Value>,
    #[serde(default)]
    constraints: Constraints,
    #[serde(default)]
    description: String,
}

/// Keeps an explicit `null` distinct from an absent key
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<RawFieldDef> for FieldDef {
    type Error = String;

    fn try_from(raw: RawFieldDef) -> Result<Self, Self::Error> {
        let default = match (raw.required, raw.default) {
            (Some(true), Some(_)) => {
                return Err(format!(
                    "field '{}' is required and cannot declare a default",
                    raw.name
                ))
            }
            (Some(false), None) => Some(Value::Null),
            (_, default) => default,
        };

        Ok(FieldDef {
            name: raw.name,
            field_type: raw.field_type,
            required: default.is_none(),
            default,
            constraints: raw.constraints,
            description: raw.description,
        })
    }
}

/// A named record type: one collection in the viewer's store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    #[serde(rename = "type_name")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    pub fields: Vec<FieldDef>,
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            fields: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a field, keeping declaration order
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Storage collection name (lower-cased type name)
    pub fn collection_name(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.required)
    }
}
