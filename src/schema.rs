//! JSON Schema derivation for structured outputs
//!
//! A payload type is described once, as a Rust type deriving `Serialize`,
//! `Deserialize` and `JsonSchema`. The schema sent to the remote model and the
//! decoder in [`crate::codec`] both come from that one description.
//!
//! The outbound schema is strict: every object lists all of its properties as
//! `required` and sets `additionalProperties: false`. The inbound decoder is
//! lenient by default (see [`crate::codec::UnknownFields`]).

use schemars::generate::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// A type the remote model can be asked to produce.
///
/// Types whose fields have no `JsonSchema` impl fail to compile here, before
/// any request can be built.
pub trait StructuredOutput: Serialize + DeserializeOwned + JsonSchema {
    /// Name sent as `response_format.json_schema.name`.
    const SCHEMA_NAME: &'static str;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("recursive type at {path} cannot be inlined for strict mode")]
    Recursive { path: String },

    #[error("unconstrained value at {path} is not allowed in strict mode")]
    Unconstrained { path: String },

    #[error("object at {path} has no declared properties")]
    OpenObject { path: String },

    #[error("root schema must be an object, found {found}")]
    RootNotObject { found: String },
}

/// Derive the strict-mode JSON Schema for `T`.
pub fn strict_schema<T: JsonSchema>() -> Result<Value, SchemaError> {
    let generator = SchemaSettings::draft2020_12()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.meta_schema = None;
        })
        .into_generator();
    let mut schema = Value::from(generator.into_root_schema_for::<T>());

    if let Value::Object(map) = &mut schema {
        // Everything is inlined; what remains here is only referenced by
        // recursive `$ref`s, which are reported below.
        map.remove("$defs");
        map.remove("$schema");
    }

    enforce_strict(&mut schema, "$")?;

    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(SchemaError::RootNotObject {
            found: type_label(&schema),
        });
    }

    Ok(schema)
}

fn enforce_strict(schema: &mut Value, path: &str) -> Result<(), SchemaError> {
    let map = match schema {
        Value::Object(map) => map,
        _ => {
            return Err(SchemaError::Unconstrained {
                path: path.to_string(),
            })
        }
    };

    if map.contains_key("$ref") {
        return Err(SchemaError::Recursive {
            path: path.to_string(),
        });
    }

    map.remove("format");
    widen_integers(map);

    for key in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(branches)) = map.get_mut(key) {
            for branch in branches.iter_mut() {
                enforce_strict(branch, path)?;
            }
        }
    }

    if let Some(items) = map.get_mut("items") {
        enforce_strict(items, &format!("{path}[]"))?;
    }

    if declares_type(map, "object") {
        let properties = match map.get_mut("properties") {
            Some(Value::Object(properties)) if !properties.is_empty() => properties,
            _ => {
                return Err(SchemaError::OpenObject {
                    path: path.to_string(),
                })
            }
        };

        let mut required = Vec::with_capacity(properties.len());
        for (name, property) in properties.iter_mut() {
            enforce_strict(property, &format!("{path}.{name}"))?;
            required.push(Value::String(name.clone()));
        }

        map.insert("required".to_string(), Value::Array(required));
        map.insert("additionalProperties".to_string(), Value::Bool(false));
    }

    Ok(())
}

fn widen_integers(map: &mut Map<String, Value>) {
    match map.get_mut("type") {
        Some(Value::String(kind)) if kind.as_str() == "integer" => *kind = "number".to_string(),
        Some(Value::Array(kinds)) => {
            for kind in kinds.iter_mut() {
                if kind.as_str() == Some("integer") {
                    *kind = Value::String("number".to_string());
                }
            }
        }
        _ => {}
    }
}

fn declares_type(map: &Map<String, Value>, wanted: &str) -> bool {
    match map.get("type") {
        Some(Value::String(kind)) => kind == wanted,
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some(wanted)),
        _ => false,
    }
}

fn type_label(schema: &Value) -> String {
    match schema.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(other) => other.to_string(),
        None => "untyped schema".to_string(),
    }
}
