//! Schema-driven encoding and decoding of structured payloads
//!
//! [`SchemaCodec`] pairs a payload type with the strict schema derived from
//! it. Decoding first walks the incoming JSON against that schema, so a
//! violation is reported with the exact field path, the expected kind and
//! what was actually found. Only then is the value converted into `T`.
//!
//! The outbound schema forbids extra properties, but the producer is an
//! external service that may grow its payloads independently of this client.
//! Inbound decoding therefore ignores undeclared keys unless
//! [`UnknownFields::Reject`] is selected explicitly.

use crate::schema::{strict_schema, SchemaError, StructuredOutput};
use serde_json::Value;
use std::marker::PhantomData;
use thiserror::Error;

/// How the decoder treats object keys the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFields {
    #[default]
    Ignore,
    Reject,
}

/// A payload that does not match the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: expected {expected}, found {actual}")]
pub struct DecodeError {
    /// Location of the offending value, rooted at `$`.
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl DecodeError {
    fn new(path: &str, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

pub struct SchemaCodec<T> {
    schema: Value,
    unknown_fields: UnknownFields,
    _payload: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for SchemaCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCodec")
            .field("schema", &self.schema)
            .field("unknown_fields", &self.unknown_fields)
            .finish()
    }
}

impl<T: StructuredOutput> SchemaCodec<T> {
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            schema: strict_schema::<T>()?,
            unknown_fields: UnknownFields::default(),
            _payload: PhantomData,
        })
    }

    pub fn with_unknown_fields(mut self, policy: UnknownFields) -> Self {
        self.unknown_fields = policy;
        self
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn schema_name(&self) -> &'static str {
        T::SCHEMA_NAME
    }

    /// Encode a value; property names are exactly the schema's.
    pub fn encode(&self, value: &T) -> crate::Result<Value> {
        Ok(serde_json::to_value(value)?)
    }

    /// Parse `text` as JSON and decode it.
    pub fn decode_str(&self, text: &str) -> Result<T, DecodeError> {
        let json: Value = serde_json::from_str(text)
            .map_err(|e| DecodeError::new("$", "a JSON document", e.to_string()))?;
        self.decode(&json)
    }

    /// Decode a JSON value, failing on the first schema violation.
    pub fn decode(&self, json: &Value) -> Result<T, DecodeError> {
        check(&self.schema, json, "$", self.unknown_fields)?;

        serde_path_to_error::deserialize(json).map_err(|e| {
            let path = match e.path().to_string() {
                p if p == "." => "$".to_string(),
                p => format!("$.{}", p),
            };
            let (expected, actual) = split_serde_message(&e.into_inner().to_string());
            DecodeError::new(&path, expected, actual)
        })
    }
}

/// Split serde's "invalid type: X, expected Y" into (Y, X).
fn split_serde_message(message: &str) -> (String, String) {
    let message = message
        .split(" at line ")
        .next()
        .unwrap_or(message);
    match message.rsplit_once(", expected ") {
        Some((found, expected)) => {
            let found = found
                .trim_start_matches("invalid type: ")
                .trim_start_matches("invalid value: ");
            (expected.to_string(), found.to_string())
        }
        None => ("a valid value".to_string(), message.to_string()),
    }
}

fn check(
    schema: &Value,
    value: &Value,
    path: &str,
    policy: UnknownFields,
) -> Result<(), DecodeError> {
    let Some(map) = schema.as_object() else {
        return Ok(());
    };

    if let Some(Value::Array(branches)) = map.get("anyOf").or_else(|| map.get("oneOf")) {
        if branches
            .iter()
            .any(|branch| check(branch, value, path, policy).is_ok())
        {
            return Ok(());
        }
        return Err(DecodeError::new(path, expected_kind(schema), describe(value)));
    }

    if let Some(kinds) = map.get("type") {
        if !type_matches(kinds, value) {
            return Err(DecodeError::new(path, expected_kind(schema), describe(value)));
        }
    }

    if let Some(Value::Array(allowed)) = map.get("enum") {
        if !allowed.contains(value) {
            let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
            return Err(DecodeError::new(
                path,
                format!("one of {}", options.join(", ")),
                describe(value),
            ));
        }
    }

    match value {
        Value::Object(fields) => {
            let empty = serde_json::Map::new();
            let properties = map
                .get("properties")
                .and_then(Value::as_object)
                .unwrap_or(&empty);

            for (name, property) in properties {
                let child = format!("{path}.{name}");
                match fields.get(name) {
                    Some(field) => check(property, field, &child, policy)?,
                    None if is_required(map, name) => {
                        return Err(DecodeError::new(&child, expected_kind(property), "missing"));
                    }
                    None => {}
                }
            }

            if policy == UnknownFields::Reject {
                if let Some(extra) = fields.keys().find(|key| !properties.contains_key(*key)) {
                    return Err(DecodeError::new(
                        &format!("{path}.{extra}"),
                        "no such field",
                        "unexpected field",
                    ));
                }
            }
        }
        Value::Array(elements) => {
            if let Some(items) = map.get("items") {
                for (index, element) in elements.iter().enumerate() {
                    check(items, element, &format!("{path}[{index}]"), policy)?;
                }
            }
        }
        _ => {}
    }

    Ok(())
}

fn is_required(schema: &serde_json::Map<String, Value>, name: &str) -> bool {
    schema
        .get("required")
        .and_then(Value::as_array)
        .is_some_and(|required| required.iter().any(|r| r.as_str() == Some(name)))
}

fn type_matches(kinds: &Value, value: &Value) -> bool {
    match kinds {
        Value::String(kind) => kind_matches(kind, value),
        Value::Array(kinds) => kinds
            .iter()
            .filter_map(Value::as_str)
            .any(|kind| kind_matches(kind, value)),
        _ => true,
    }
}

fn kind_matches(kind: &str, value: &Value) -> bool {
    match kind {
        "null" => value.is_null(),
        "boolean" => value.is_boolean(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "string" => value.is_string(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => false,
    }
}

fn expected_kind(schema: &Value) -> String {
    if let Some(Value::Array(branches)) = schema.get("anyOf").or_else(|| schema.get("oneOf")) {
        let mut kinds: Vec<String> = Vec::new();
        for kind in branches.iter().map(expected_kind) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        return kinds.join(" or ");
    }
    match schema.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        _ => "any value".to_string(),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReasoningResult, ReasoningStep};
    use pretty_assertions::assert_eq;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Mood {
        Calm,
        Busy,
    }

    #[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
    struct Status {
        mood: Mood,
        note: Option<String>,
        active: bool,
    }

    impl StructuredOutput for Status {
        const SCHEMA_NAME: &'static str = "status";
    }

    #[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Shape {
        Circle { radius: f64 },
        Square { side: f64 },
    }

    #[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
    struct Drawing {
        shape: Shape,
    }

    impl StructuredOutput for Drawing {
        const SCHEMA_NAME: &'static str = "drawing";
    }

    #[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
    struct Counter {
        count: u32,
    }

    impl StructuredOutput for Counter {
        const SCHEMA_NAME: &'static str = "counter";
    }

    fn codec() -> SchemaCodec<ReasoningResult> {
        SchemaCodec::new().unwrap()
    }

    fn sample() -> ReasoningResult {
        ReasoningResult {
            steps: vec![
                ReasoningStep {
                    explanation: "Start with 2".to_string(),
                    output: 2.0,
                },
                ReasoningStep {
                    explanation: "Add 2".to_string(),
                    output: 4.0,
                },
            ],
            final_answer: 4.0,
        }
    }

    #[test]
    fn test_encode_then_decode_reproduces_value() {
        let codec = codec();
        let value = sample();

        let encoded = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_encode_uses_schema_property_names() {
        let codec = codec();
        let encoded = codec.encode(&sample()).unwrap();

        let mut encoded_keys: Vec<&String> = encoded.as_object().unwrap().keys().collect();
        let mut schema_keys: Vec<&String> = codec.schema()["properties"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        encoded_keys.sort();
        schema_keys.sort();
        assert_eq!(encoded_keys, schema_keys);
    }

    #[test]
    fn test_missing_required_field_names_it() {
        let err = codec()
            .decode(&json!({ "steps": [] }))
            .unwrap_err();

        assert_eq!(
            err,
            DecodeError {
                path: "$.final_answer".to_string(),
                expected: "number".to_string(),
                actual: "missing".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_nested_field_reports_full_path() {
        let err = codec()
            .decode(&json!({
                "steps": [
                    { "explanation": "ok", "output": 1 },
                    { "explanation": "no output" }
                ],
                "final_answer": 1
            }))
            .unwrap_err();

        assert_eq!(err.path, "$.steps[1].output");
        assert_eq!(err.actual, "missing");
    }

    #[test]
    fn test_wrong_primitive_kind() {
        let err = codec()
            .decode(&json!({ "steps": [], "final_answer": "four" }))
            .unwrap_err();

        assert_eq!(err.path, "$.final_answer");
        assert_eq!(err.expected, "number");
        assert_eq!(err.actual, "string \"four\"");
    }

    #[test]
    fn test_list_where_object_expected() {
        let err = codec()
            .decode(&json!({ "steps": {}, "final_answer": 4 }))
            .unwrap_err();

        assert_eq!(err.path, "$.steps");
        assert_eq!(err.expected, "array");
        assert_eq!(err.actual, "object");
    }

    #[test]
    fn test_unknown_fields_ignored_by_default() {
        let decoded = codec()
            .decode(&json!({
                "steps": [{ "explanation": "add", "output": 4, "confidence": 0.9 }],
                "final_answer": 4,
                "notes": "extra"
            }))
            .unwrap();

        assert_eq!(decoded.steps.len(), 1);
        assert_eq!(decoded.final_answer, 4.0);
    }

    #[test]
    fn test_unknown_fields_rejected_when_requested() {
        let err = codec()
            .with_unknown_fields(UnknownFields::Reject)
            .decode(&json!({ "steps": [], "final_answer": 4, "notes": "extra" }))
            .unwrap_err();

        assert_eq!(err.path, "$.notes");
        assert_eq!(err.actual, "unexpected field");
    }

    #[test]
    fn test_first_failure_wins() {
        let err = codec()
            .decode(&json!({
                "steps": [{ "explanation": 1, "output": "x" }],
                "final_answer": 4
            }))
            .unwrap_err();

        assert_eq!(err.path, "$.steps[0].explanation");
    }

    #[test]
    fn test_decode_str_reports_malformed_json() {
        let err = codec().decode_str("{\"steps\": [").unwrap_err();

        assert_eq!(err.path, "$");
        assert_eq!(err.expected, "a JSON document");
        assert!(err.actual.contains("EOF"));
    }

    #[test]
    fn test_root_must_be_object() {
        let err = codec().decode(&json!([1, 2])).unwrap_err();
        assert_eq!(err.path, "$");
        assert_eq!(err.actual, "array");
    }

    #[test]
    fn test_enum_and_nullable_fields() {
        let codec: SchemaCodec<Status> = SchemaCodec::new().unwrap();

        let decoded = codec
            .decode(&json!({ "mood": "calm", "note": null, "active": true }))
            .unwrap();
        assert_eq!(decoded.mood, Mood::Calm);
        assert_eq!(decoded.note, None);

        let err = codec
            .decode(&json!({ "mood": "angry", "note": null, "active": true }))
            .unwrap_err();
        assert_eq!(err.path, "$.mood");
        assert_eq!(err.actual, "string \"angry\"");
    }

    #[test]
    fn test_widened_integer_reports_serde_expected_kind() {
        let codec: SchemaCodec<Counter> = SchemaCodec::new().unwrap();

        let err = codec.decode(&json!({ "count": 4.5 })).unwrap_err();
        assert_eq!(err.path, "$.count");
        assert_eq!(err.expected, "u32");
        assert_eq!(err.actual, "floating point `4.5`");

        assert_eq!(codec.decode(&json!({ "count": 4 })).unwrap(), Counter { count: 4 });
    }

    #[test]
    fn test_split_serde_message_without_expected() {
        assert_eq!(
            split_serde_message("something odd"),
            ("a valid value".to_string(), "something odd".to_string())
        );
    }

    #[test]
    fn test_data_carrying_enum_is_kind_checked() {
        let codec: SchemaCodec<Drawing> = SchemaCodec::new().unwrap();

        let decoded = codec
            .decode(&json!({ "shape": { "circle": { "radius": 2.0 } } }))
            .unwrap();
        assert_eq!(decoded.shape, Shape::Circle { radius: 2.0 });

        let err = codec.decode(&json!({ "shape": "circle" })).unwrap_err();
        assert_eq!(err.path, "$.shape");
        assert_eq!(err.expected, "object");
        assert_eq!(err.actual, "string \"circle\"");

        let err = codec
            .decode(&json!({ "shape": { "circle": { "radius": "big" } } }))
            .unwrap_err();
        assert_eq!(err.path, "$.shape");
        assert_eq!(err.actual, "object");
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::new("$.steps[0].output", "number", "missing");
        assert_eq!(
            err.to_string(),
            "$.steps[0].output: expected number, found missing"
        );
    }
}
