//! Record validation against a record type
//!
//! Validation semantics:
//! - the candidate must be a JSON object
//! - every declared field is checked; violations are collected, never
//!   short-circuited
//! - omitted optional fields take their default (null included)
//! - undeclared keys are dropped from the normalized record
//! - ints accept integral numbers (`5.0` becomes `5`), floats accept any number
//!
//! Validation is pure: no I/O, no side effects, and validating a normalized
//! record returns it unchanged.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::schema::{FieldDef, FieldType, RecordType};

/// Path used for violations that concern the whole candidate
pub const ROOT_FIELD: &str = "$root";

/// Which rule a value broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    NotAnObject,
    Missing,
    NullNotAllowed,
    Type,
    Email,
    Min,
    Max,
    MinLength,
    MaxLength,
    Choices,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::NotAnObject => "not_an_object",
            Rule::Missing => "missing",
            Rule::NullNotAllowed => "null_not_allowed",
            Rule::Type => "type",
            Rule::Email => "email",
            Rule::Min => "min",
            Rule::Max => "max",
            Rule::MinLength => "min_length",
            Rule::MaxLength => "max_length",
            Rule::Choices => "choices",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub rule: Rule,
    pub message: String,
    /// The supplied value; absent when the field was missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Violation {
    fn new(field: &str, rule: Rule, message: impl Into<String>, value: Option<&Value>) -> Self {
        Self {
            field: field.to_string(),
            rule,
            message: message.into(),
            value: value.cloned(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found in one candidate record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub record_type: String,
    pub violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    /// Violations for a single field
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations.iter().filter(move |v| v.field == field)
    }

    pub fn has(&self, field: &str, rule: Rule) -> bool {
        self.violations
            .iter()
            .any(|v| v.field == field && v.rule == rule)
    }

    /// Distinct field names with at least one violation, in report order
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for v in &self.violations {
            if !fields.contains(&v.field.as_str()) {
                fields.push(&v.field);
            }
        }
        fields
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s) in {}", self.violations.len(), self.record_type)?;
        for (i, v) in self.violations.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, v)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

/// A candidate that passed validation, with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatedRecord(Map<String, Value>);

impl ValidatedRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Validate `candidate` against `record_type`
pub fn validate_record(
    record_type: &RecordType,
    candidate: &Value,
) -> Result<ValidatedRecord, ValidationErrors> {
    let fail = |violations: Vec<Violation>| ValidationErrors {
        record_type: record_type.name.clone(),
        violations,
    };

    let Some(obj) = candidate.as_object() else {
        return Err(fail(vec![Violation::new(
            ROOT_FIELD,
            Rule::NotAnObject,
            format!("expected object, got {}", json_type_name(candidate)),
            Some(candidate),
        )]));
    };

    let mut normalized = Map::new();
    let mut violations = Vec::new();

    for field in &record_type.fields {
        match obj.get(&field.name) {
            None => match &field.default {
                Some(default) => {
                    normalized.insert(field.name.clone(), default.clone());
                }
                None => violations.push(Violation::new(
                    &field.name,
                    Rule::Missing,
                    "field required",
                    None,
                )),
            },
            Some(Value::Null) if field.is_nullable() => {
                normalized.insert(field.name.clone(), Value::Null);
            }
            Some(Value::Null) => violations.push(Violation::new(
                &field.name,
                Rule::NullNotAllowed,
                "null is not allowed",
                Some(&Value::Null),
            )),
            Some(value) => match check_value(field, value) {
                Ok(value) => {
                    normalized.insert(field.name.clone(), value);
                }
                Err(mut found) => violations.append(&mut found),
            },
        }
    }

    for key in obj.keys() {
        if record_type.get_field(key).is_none() {
            tracing::debug!(
                record_type = %record_type.name,
                field = %key,
                "dropping undeclared field"
            );
        }
    }

    if violations.is_empty() {
        Ok(ValidatedRecord(normalized))
    } else {
        Err(fail(violations))
    }
}

/// Check a non-null value against a field's type and constraints
///
/// Returns the normalized value, or every violation it triggers.
pub fn check_value(field: &FieldDef, value: &Value) -> Result<Value, Vec<Violation>> {
    let normalized = coerce(field, value).map_err(|v| vec![v])?;

    let mut violations = Vec::new();
    let constraints = &field.constraints;

    if field.field_type.is_numeric() {
        if let Some(n) = normalized.as_f64() {
            if let Some(min) = constraints.min_value() {
                if n < min {
                    violations.push(Violation::new(
                        &field.name,
                        Rule::Min,
                        format!("must be >= {}", display_bound(&constraints.min)),
                        Some(value),
                    ));
                }
            }
            if let Some(max) = constraints.max_value() {
                if n > max {
                    violations.push(Violation::new(
                        &field.name,
                        Rule::Max,
                        format!("must be <= {}", display_bound(&constraints.max)),
                        Some(value),
                    ));
                }
            }
        }
    }

    if field.field_type.is_textual() {
        if let Some(s) = normalized.as_str() {
            let len = s.chars().count();
            if let Some(min_length) = constraints.min_length {
                if len < min_length {
                    violations.push(Violation::new(
                        &field.name,
                        Rule::MinLength,
                        format!("must be at least {} characters, got {}", min_length, len),
                        Some(value),
                    ));
                }
            }
            if let Some(max_length) = constraints.max_length {
                if len > max_length {
                    violations.push(Violation::new(
                        &field.name,
                        Rule::MaxLength,
                        format!("must be at most {} characters, got {}", max_length, len),
                        Some(value),
                    ));
                }
            }
        }
    }

    if let Some(choices) = &constraints.choices {
        if !choices.iter().any(|c| same_choice(c, &normalized)) {
            violations.push(Violation::new(
                &field.name,
                Rule::Choices,
                format!("must be one of {}", Value::Array(choices.clone())),
                Some(value),
            ));
        }
    }

    if violations.is_empty() {
        Ok(normalized)
    } else {
        Err(violations)
    }
}

/// Convert a value to the field's canonical representation
fn coerce(field: &FieldDef, value: &Value) -> Result<Value, Violation> {
    let mismatch = || {
        Violation::new(
            &field.name,
            Rule::Type,
            format!("expected {}, got {}", field.field_type, json_type_name(value)),
            Some(value),
        )
    };

    match field.field_type {
        FieldType::String => value.as_str().map(Value::from).ok_or_else(mismatch),
        FieldType::Email => {
            let s = value.as_str().ok_or_else(mismatch)?.trim();
            if email_pattern().is_match(s) {
                Ok(Value::from(s))
            } else {
                Err(Violation::new(
                    &field.name,
                    Rule::Email,
                    "not a valid email address",
                    Some(value),
                ))
            }
        }
        FieldType::Int => as_integer(value).map(Value::from).ok_or_else(mismatch),
        FieldType::Float => value
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(mismatch),
        FieldType::Bool => value.as_bool().map(Value::from).ok_or_else(mismatch),
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    // u64 beyond i64::MAX lands here too and is rejected by the range check
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Numeric choices compare by value, so `1` matches `1.0`
fn same_choice(choice: &Value, value: &Value) -> bool {
    match (choice.as_f64(), value.as_f64()) {
        (Some(a), Some(b)) if choice.is_number() && value.is_number() => a == b,
        _ => choice == value,
    }
}

fn display_bound(bound: &Option<Number>) -> String {
    bound.as_ref().map(Number::to_string).unwrap_or_default()
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        // dot-atom local part, hostname labels joined by single dots
        Regex::new(concat!(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
            r"@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?",
            r"(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$",
        ))
        .expect("email pattern compiles")
    })
}

/// Returns the JSON type name of a value for error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RecordType {
        RecordType::new("Sample")
            .field(FieldDef::string("title").min_length(3).max_length(8))
            .field(FieldDef::email("email"))
            .field(FieldDef::int("count").optional().min(0).max(10))
            .field(FieldDef::float("ratio").with_default(0.5).min(0).max(1))
            .field(FieldDef::bool("enabled").with_default(true))
            .field(FieldDef::string("tier").optional().choices(["free", "pro"]))
    }

    #[test]
    fn test_defaults_applied_in_declaration_order() {
        let record = validate_record(
            &sample(),
            &json!({ "email": "a@b.co", "title": "Hello" }),
        )
        .unwrap();

        let keys: Vec<&String> = record.as_map().keys().collect();
        assert_eq!(keys, ["title", "email", "count", "ratio", "enabled", "tier"]);
        assert_eq!(record.get("count"), Some(&Value::Null));
        assert_eq!(record.get("ratio"), Some(&json!(0.5)));
        assert_eq!(record.get("enabled"), Some(&json!(true)));
    }

    #[test]
    fn test_violations_collected_exhaustively() {
        let errors = validate_record(
            &sample(),
            &json!({ "title": "Hi", "count": 11, "ratio": "high", "enabled": null }),
        )
        .unwrap_err();

        assert_eq!(errors.record_type, "Sample");
        assert!(errors.has("title", Rule::MinLength));
        assert!(errors.has("email", Rule::Missing));
        assert!(errors.has("count", Rule::Max));
        assert!(errors.has("ratio", Rule::Type));
        assert!(errors.has("enabled", Rule::NullNotAllowed));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_missing_violation_has_no_value() {
        let errors = validate_record(&sample(), &json!({ "title": "Hello" })).unwrap_err();
        let missing = errors.for_field("email").next().unwrap();
        assert_eq!(missing.rule, Rule::Missing);
        assert_eq!(missing.value, None);
    }

    #[test]
    fn test_non_object_candidate() {
        let errors = validate_record(&sample(), &json!([1, 2])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.has(ROOT_FIELD, Rule::NotAnObject));
    }

    #[test]
    fn test_length_bounds_inclusive() {
        let base = json!({ "email": "a@b.co" });
        let cases = [("abc", true), ("abcdefgh", true), ("ab", false), ("abcdefghi", false)];
        for (title, ok) in cases {
            let mut candidate = base.clone();
            candidate["title"] = json!(title);
            assert_eq!(validate_record(&sample(), &candidate).is_ok(), ok, "title {:?}", title);
        }
    }

    #[test]
    fn test_length_counts_characters() {
        let field = FieldDef::string("name").min_length(2);
        assert!(check_value(&field, &json!("é")).is_err());
        assert!(check_value(&field, &json!("éé")).is_ok());
    }

    #[test]
    fn test_int_coercion() {
        let field = FieldDef::int("n");
        assert_eq!(check_value(&field, &json!(5.0)).unwrap(), json!(5));
        assert_eq!(check_value(&field, &json!(-3)).unwrap(), json!(-3));

        let errors = check_value(&field, &json!(5.5)).unwrap_err();
        assert_eq!(errors[0].rule, Rule::Type);
        assert!(check_value(&field, &json!("5")).is_err());
        assert!(check_value(&field, &json!(u64::MAX)).is_err());
    }

    #[test]
    fn test_float_normalized() {
        let field = FieldDef::float("price");
        let value = check_value(&field, &json!(3)).unwrap();
        assert!(matches!(&value, Value::Number(n) if n.is_f64()));
        assert_eq!(value.as_f64(), Some(3.0));
        assert!(check_value(&field, &json!(true)).is_err());
    }

    #[test]
    fn test_email_checks() {
        let field = FieldDef::email("email");
        let trimmed = check_value(&field, &json!("  jo@example.com ")).unwrap();
        assert_eq!(trimmed, json!("jo@example.com"));

        for good in ["jo.ann+tag@mail.example.com", "o'neil@ex-ample.io"] {
            assert!(check_value(&field, &json!(good)).is_ok(), "{}", good);
        }

        let bad_addresses = [
            "jo",
            "jo@",
            "@example.com",
            "jo@example",
            "jo @example.com",
            "a@b..com",
            "a..b@c.com",
            ".a@b.com",
            "a@-b.com",
            "a.@b.com",
            "a@b-.com",
        ];
        for bad in bad_addresses {
            let errors = check_value(&field, &json!(bad)).unwrap_err();
            assert_eq!(errors[0].rule, Rule::Email, "{}", bad);
        }

        let errors = check_value(&field, &json!(42)).unwrap_err();
        assert_eq!(errors[0].rule, Rule::Type);
    }

    #[test]
    fn test_choices() {
        let candidate = json!({ "title": "Hello", "email": "a@b.co", "tier": "gold" });
        let errors = validate_record(&sample(), &candidate).unwrap_err();
        assert!(errors.has("tier", Rule::Choices));

        let field = FieldDef::float("level").choices([1, 2]);
        assert!(check_value(&field, &json!(1.0)).is_ok());
    }

    #[test]
    fn test_undeclared_fields_dropped() {
        let record = validate_record(
            &sample(),
            &json!({ "title": "Hello", "email": "a@b.co", "extra": 1 }),
        )
        .unwrap();
        assert!(!record.contains("extra"));
    }

    #[test]
    fn test_validation_idempotent() {
        let candidate = json!({ "title": "Hello", "email": " a@b.co", "count": 4.0, "ratio": 1 });
        let first = validate_record(&sample(), &candidate).unwrap();
        let second = validate_record(&sample(), &first.clone().into_value()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_errors_display() {
        let errors = validate_record(&sample(), &json!({})).unwrap_err();
        let text = errors.to_string();
        assert!(text.starts_with("2 violation(s) in Sample: "));
        assert!(text.contains("title: field required"));
    }
}
