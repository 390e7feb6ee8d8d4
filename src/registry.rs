//! Schema Registry
//!
//! Holds the immutable set of record types the viewer reads. A registry is
//! assembled once through [`RegistryBuilder`], which enforces the definition
//! invariants, and is read-only afterwards.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog;
use crate::checksum::Checksum;
use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::json_schema;
use crate::schema::RecordType;
use crate::validate::{self, ValidatedRecord};

/// The main schema registry
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    /// Record types in declaration order
    record_types: Vec<RecordType>,
    /// Lower-cased type name -> index into `record_types`
    index: HashMap<String, usize>,
    /// Fingerprint of `record_types`
    checksum: Checksum,
}

impl SchemaRegistry {
    /// Start assembling a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry over the built-in record types
    pub fn builtin() -> Result<Self> {
        Self::builder()
            .extend(catalog::builtin_record_types())
            .build()
    }

    /// Assemble a registry as described by configuration
    ///
    /// Built-in types come first (unless disabled), then every definition
    /// file in the order listed.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let mut builder = Self::builder();
        if config.include_builtin {
            builder = builder.extend(catalog::builtin_record_types());
        }
        for path in &config.definitions {
            builder = builder.extend(load_definitions(path)?);
        }
        builder.build()
    }

    /// Names of all record types, in declaration order
    pub fn list_record_types(&self) -> Vec<&str> {
        self.record_types.iter().map(|r| r.name.as_str()).collect()
    }

    /// All record types, in declaration order
    pub fn record_types(&self) -> &[RecordType] {
        &self.record_types
    }

    pub fn len(&self) -> usize {
        self.record_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_types.is_empty()
    }

    /// Look up a record type by type name or collection name
    ///
    /// Matching ignores case, so `"User"` and `"user"` are the same type.
    pub fn get_schema(&self, name: &str) -> Result<&RecordType> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| &self.record_types[i])
            .ok_or_else(|| SchemaError::NotFound {
                name: name.to_string(),
                suggestion: self.suggest(name),
            })
    }

    /// Validate a candidate record against the named record type
    pub fn validate(&self, name: &str, candidate: &Value) -> Result<ValidatedRecord> {
        let record_type = self.get_schema(name)?;
        validate::validate_record(record_type, candidate).map_err(|errors| {
            tracing::debug!(
                record_type = %record_type.name,
                violations = errors.len(),
                "candidate record rejected"
            );
            SchemaError::Validation(errors)
        })
    }

    /// JSON Schema export of the named record type
    pub fn json_schema(&self, name: &str) -> Result<Value> {
        self.get_schema(name).map(json_schema::to_json_schema)
    }

    /// Fingerprint over every definition in the registry
    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// The document served at `GET /schema`
    pub fn describe(&self) -> SchemaDocument {
        SchemaDocument {
            schemas: self
                .record_types
                .iter()
                .map(|record| DocumentEntry {
                    collection: record.collection_name(),
                    record: record.clone(),
                })
                .collect(),
            fingerprint: self.checksum.clone(),
        }
    }

    /// Closest registered name to `query`, if any is close enough
    fn suggest(&self, query: &str) -> Option<String> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        if query.is_empty() {
            return None;
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let mut best: Option<(i64, &str)> = None;

        for record in &self.record_types {
            // Match the name against the query and the query against the name,
            // so both abbreviations and over-long inputs find a candidate
            let score = matcher
                .fuzzy_match(&record.name, query)
                .into_iter()
                .chain(matcher.fuzzy_match(query, &record.name))
                .max();

            if let Some(score) = score {
                if best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, record.name.as_str()));
                }
            }
        }

        best.map(|(_, name)| name.to_string())
    }
}

/// Collects record types and checks them before freezing the registry
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    record_types: Vec<RecordType>,
}

impl RegistryBuilder {
    pub fn record_type(mut self, record_type: RecordType) -> Self {
        self.record_types.push(record_type);
        self
    }

    pub fn extend(mut self, record_types: impl IntoIterator<Item = RecordType>) -> Self {
        self.record_types.extend(record_types);
        self
    }

    /// Check every definition and freeze the registry
    pub fn build(self) -> Result<SchemaRegistry> {
        let mut index = HashMap::new();

        for (i, record) in self.record_types.iter().enumerate() {
            check_definition(record)?;
            if index.insert(record.name.to_lowercase(), i).is_some() {
                return Err(SchemaError::DuplicateRecordType(record.name.clone()));
            }
        }

        let checksum = Checksum::of_json(&self.record_types)?;
        tracing::info!(
            record_types = self.record_types.len(),
            checksum = %checksum,
            "schema registry ready"
        );

        Ok(SchemaRegistry {
            record_types: self.record_types,
            index,
            checksum,
        })
    }
}

/// Check the invariants of a single record type
fn check_definition(record: &RecordType) -> Result<()> {
    if !is_identifier(&record.name) {
        return Err(SchemaError::InvalidDefinition(format!(
            "record type name '{}' is not an identifier",
            record.name
        )));
    }

    let mut seen = HashSet::new();
    for field in &record.fields {
        if !is_identifier(&field.name) {
            return Err(SchemaError::InvalidDefinition(format!(
                "{}: field name '{}' is not an identifier",
                record.name, field.name
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                record_type: record.name.clone(),
                field: field.name.clone(),
            });
        }
        if field.required == field.default.is_some() {
            return Err(SchemaError::InvalidDefinition(format!(
                "{}.{}: required must be set exactly when there is no default",
                record.name, field.name
            )));
        }

        let c = &field.constraints;
        if (c.min.is_some() || c.max.is_some()) && !field.field_type.is_numeric() {
            return Err(SchemaError::InvalidDefinition(format!(
                "{}.{}: min/max apply to numeric fields only, not {}",
                record.name, field.name, field.field_type
            )));
        }
        if (c.min_length.is_some() || c.max_length.is_some()) && !field.field_type.is_textual() {
            return Err(SchemaError::InvalidDefinition(format!(
                "{}.{}: length bounds apply to text fields only, not {}",
                record.name, field.name, field.field_type
            )));
        }
        if let (Some(min), Some(max)) = (c.min_value(), c.max_value()) {
            if min > max {
                return Err(SchemaError::InvalidDefinition(format!(
                    "{}.{}: empty range [{}, {}]",
                    record.name, field.name, min, max
                )));
            }
        }
        if let (Some(min), Some(max)) = (c.min_length, c.max_length) {
            if min > max {
                return Err(SchemaError::InvalidDefinition(format!(
                    "{}.{}: min_length {} exceeds max_length {}",
                    record.name, field.name, min, max
                )));
            }
        }

        match &field.default {
            None | Some(Value::Null) => {}
            Some(default) => {
                if let Err(violations) = validate::check_value(field, default) {
                    let reasons: Vec<String> =
                        violations.iter().map(|v| v.message.clone()).collect();
                    return Err(SchemaError::InvalidDefinition(format!(
                        "{}.{}: default {} is invalid: {}",
                        record.name,
                        field.name,
                        default,
                        reasons.join(", ")
                    )));
                }
            }
        }
    }

    json_schema::compile(record)?;
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Read record type definitions from a JSON file
///
/// The file holds either a single record type or an array of them.
pub fn load_definitions(path: impl AsRef<Path>) -> Result<Vec<RecordType>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DefinitionFile {
        Many(Vec<RecordType>),
        One(RecordType),
    }

    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let definitions = match serde_json::from_str(&content)? {
        DefinitionFile::Many(many) => many,
        DefinitionFile::One(one) => vec![one],
    };

    tracing::debug!(
        path = %path.display(),
        count = definitions.len(),
        "loaded record type definitions"
    );
    Ok(definitions)
}

/// Serialized registry, as served to the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub schemas: Vec<DocumentEntry>,
    pub fingerprint: Checksum,
}

/// One record type in a [`SchemaDocument`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Storage collection name
    pub collection: String,
    #[serde(flatten)]
    pub record: RecordType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_registry() {
        let registry = SchemaRegistry::builtin().unwrap();
        assert_eq!(registry.list_record_types(), ["User", "Product", "Lead", "Inquiry"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_lookup_ignores_case() {
        let registry = SchemaRegistry::builtin().unwrap();
        assert_eq!(registry.get_schema("user").unwrap().name, "User");
        assert_eq!(registry.get_schema("INQUIRY").unwrap().name, "Inquiry");
    }

    #[test]
    fn test_not_found_suggests() {
        let registry = SchemaRegistry::builtin().unwrap();

        match registry.get_schema("prod") {
            Err(SchemaError::NotFound { name, suggestion }) => {
                assert_eq!(name, "prod");
                assert_eq!(suggestion.as_deref(), Some("Product"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let err = registry.get_schema("zzz").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_duplicate_record_type_rejected() {
        let result = SchemaRegistry::builder()
            .record_type(RecordType::new("Note"))
            .record_type(RecordType::new("note"))
            .build();
        assert!(matches!(result, Err(SchemaError::DuplicateRecordType(name)) if name == "note"));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = SchemaRegistry::builder()
            .record_type(
                RecordType::new("Note")
                    .field(FieldDef::string("body"))
                    .field(FieldDef::string("body").optional()),
            )
            .build();
        assert!(matches!(result, Err(SchemaError::DuplicateField { .. })));
    }

    #[test]
    fn test_invalid_default_rejected() {
        let stars = FieldDef::int("stars").with_default(9).max(5);
        let result = SchemaRegistry::builder()
            .record_type(RecordType::new("Note").field(stars))
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDefinition(_))));

        let pinned = FieldDef::bool("pinned").with_default("yes");
        let result = SchemaRegistry::builder()
            .record_type(RecordType::new("Note").field(pinned))
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDefinition(_))));
    }

    #[test]
    fn test_misplaced_constraints_rejected() {
        let result = SchemaRegistry::builder()
            .record_type(RecordType::new("Note").field(FieldDef::string("body").min(1)))
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDefinition(_))));

        let result = SchemaRegistry::builder()
            .record_type(RecordType::new("Note").field(FieldDef::int("n").min(5).max(1)))
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDefinition(_))));
    }

    #[test]
    fn test_empty_length_range_rejected() {
        let body = FieldDef::string("body").min_length(5).max_length(2);
        let result = SchemaRegistry::builder()
            .record_type(RecordType::new("Note").field(body))
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDefinition(_))));
    }

    #[test]
    fn test_bad_field_name_rejected() {
        let result = SchemaRegistry::builder()
            .record_type(RecordType::new("Note").field(FieldDef::string("first name")))
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDefinition(_))));
    }

    #[test]
    fn test_inconsistent_required_rejected() {
        let mut optional_without_default = FieldDef::string("body");
        optional_without_default.required = false;
        let result = SchemaRegistry::builder()
            .record_type(RecordType::new("Note").field(optional_without_default))
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDefinition(_))));

        let mut required_with_default = FieldDef::string("body").with_default(json!("x"));
        required_with_default.required = true;
        let result = SchemaRegistry::builder()
            .record_type(RecordType::new("Note").field(required_with_default))
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDefinition(_))));
    }

    #[test]
    fn test_bad_identifier_rejected() {
        let result = SchemaRegistry::builder()
            .record_type(RecordType::new("Blog Post"))
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDefinition(_))));
    }

    #[test]
    fn test_checksum_tracks_definitions() {
        let a = SchemaRegistry::builtin().unwrap();
        let b = SchemaRegistry::builtin().unwrap();
        assert_eq!(a.checksum(), b.checksum());

        let c = SchemaRegistry::builder()
            .extend(catalog::builtin_record_types())
            .record_type(RecordType::new("Note").field(FieldDef::string("body")))
            .build()
            .unwrap();
        assert_ne!(a.checksum(), c.checksum());
    }

    #[test]
    fn test_describe_document_shape() {
        let registry = SchemaRegistry::builtin().unwrap();
        let doc = serde_json::to_value(registry.describe()).unwrap();

        let user = &doc["schemas"][0];
        assert_eq!(user["type_name"], "User");
        assert_eq!(user["collection"], "user");
        assert_eq!(user["fields"][3]["name"], "age");
        assert_eq!(user["fields"][3]["default"], Value::Null);
        assert_eq!(user["fields"][3]["constraints"], json!({ "min": 0, "max": 120 }));
        assert_eq!(doc["fingerprint"], registry.checksum().as_str());
    }

    #[test]
    fn test_load_definitions_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.json");
        fs::write(
            &path,
            serde_json::to_string(&json!({
                "type_name": "Note",
                "fields": [
                    { "name": "body", "type": "string", "constraints": { "min_length": 1 } },
                    { "name": "pinned", "type": "bool", "default": false }
                ]
            }))
            .unwrap(),
        )
        .unwrap();

        let config = RegistryConfig {
            include_builtin: true,
            definitions: vec![path],
        };
        let registry = SchemaRegistry::from_config(&config).unwrap();
        assert_eq!(registry.list_record_types().last(), Some(&"Note"));

        let record = registry.validate("note", &json!({ "body": "x" })).unwrap();
        assert_eq!(record.get("pinned"), Some(&json!(false)));
    }

    #[test]
    fn test_load_definitions_missing_file() {
        let config = RegistryConfig {
            include_builtin: false,
            definitions: vec!["/nonexistent/defs.json".into()],
        };
        assert!(matches!(SchemaRegistry::from_config(&config), Err(SchemaError::Io(_))));
    }
}
