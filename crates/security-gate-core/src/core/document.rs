// crates/security-gate-core/src/core/document.rs
// ============================================================================
// Module: Security Gate Structured Documents
// Description: Decoding of untrusted JSON/YAML into a tagged document value.
// Purpose: Give parsers and the policy evaluator one statically typed tree.
// Dependencies: serde, serde_json, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! Both structured-text formats decode into [`Document`], a tagged value
//! (object/array/string/number/bool/null). YAML mapping keys are normalized to
//! strings; keys that are themselves collections are rejected, matching the
//! behavior of hashable-key YAML loaders. Tags are dropped and the tagged
//! value is kept.
//!
//! YAML loading follows the common safe-loader semantics: a repeated mapping
//! key keeps its last value, and `<<` merge keys are resolved with explicit
//! entries taking precedence over merged ones.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::FpCategory;

use serde::Deserialize;
use serde::Deserializer;
use serde::de::EnumAccess;
use serde::de::MapAccess;
use serde::de::SeqAccess;
use serde::de::VariantAccess;
use serde::de::Visitor;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Tagged document value decoded from untrusted structured text.
pub type Document = Value;

/// Document decoding errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Bytes are not valid UTF-8.
    #[error("document is not valid utf-8")]
    Utf8,
    /// JSON syntax error.
    #[error("invalid json: {0}")]
    Json(String),
    /// YAML syntax error.
    #[error("invalid yaml: {0}")]
    Yaml(String),
    /// A YAML mapping key is a collection.
    #[error("unsupported mapping key")]
    UnsupportedKey,
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes UTF-8 JSON bytes into a document.
///
/// # Errors
///
/// Returns [`DocumentError`] when the bytes are not UTF-8 or not JSON.
pub fn decode_json(bytes: &[u8]) -> Result<Document, DocumentError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DocumentError::Utf8)?;
    serde_json::from_str(text).map_err(|err| DocumentError::Json(err.to_string()))
}

/// Decodes UTF-8 YAML bytes into a document.
///
/// # Errors
///
/// Returns [`DocumentError`] when the bytes are not UTF-8 or not YAML.
pub fn decode_yaml(bytes: &[u8]) -> Result<Document, DocumentError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DocumentError::Utf8)?;
    decode_yaml_str(text)
}

/// Decodes YAML text into a document. Blank input decodes to null.
///
/// # Errors
///
/// Returns [`DocumentError`] when the text is not YAML.
pub fn decode_yaml_str(text: &str) -> Result<Document, DocumentError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let LastWinsYaml(mut value) =
        serde_yaml::from_str(text).map_err(|err| DocumentError::Yaml(err.to_string()))?;
    value.apply_merge().map_err(|err| DocumentError::Yaml(err.to_string()))?;
    yaml_to_document(value)
}

// ============================================================================
// SECTION: YAML Loading
// ============================================================================

/// YAML node whose mappings keep the last value of a repeated key.
struct LastWinsYaml(serde_yaml::Value);

impl<'de> Deserialize<'de> for LastWinsYaml {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LastWinsVisitor).map(Self)
    }
}

/// Builds [`serde_yaml::Value`] nodes without rejecting duplicate keys.
struct LastWinsVisitor;

impl<'de> Visitor<'de> for LastWinsVisitor {
    type Value = serde_yaml::Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("any YAML value")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
        Ok(serde_yaml::Value::Bool(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
        Ok(serde_yaml::Value::Number(value.into()))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
        Ok(serde_yaml::Value::Number(value.into()))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
        Ok(serde_yaml::Value::Number(value.into()))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
        Ok(serde_yaml::Value::String(value.to_owned()))
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
        Ok(serde_yaml::Value::String(value))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(serde_yaml::Value::Null)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(serde_yaml::Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        LastWinsYaml::deserialize(deserializer).map(|node| node.0)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(LastWinsYaml(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(serde_yaml::Value::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut mapping = serde_yaml::Mapping::new();
        while let Some((LastWinsYaml(key), LastWinsYaml(value))) = map.next_entry()? {
            mapping.insert(key, value);
        }
        Ok(serde_yaml::Value::Mapping(mapping))
    }

    fn visit_enum<A>(self, data: A) -> Result<Self::Value, A::Error>
    where
        A: EnumAccess<'de>,
    {
        // Custom tags are dropped; the tagged node is kept.
        let (_tag, contents) = data.variant::<String>()?;
        contents.newtype_variant::<LastWinsYaml>().map(|node| node.0)
    }
}

/// Converts a YAML value into the tagged document representation.
fn yaml_to_document(value: serde_yaml::Value) -> Result<Document, DocumentError> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(flag) => Value::Bool(flag),
        serde_yaml::Value::Number(number) => yaml_number(&number),
        serde_yaml::Value::String(text) => Value::String(text),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_document).collect::<Result<_, _>>()?)
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, entry) in mapping {
                object.insert(yaml_key(key)?, yaml_to_document(entry)?);
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_document(tagged.value)?,
    })
}

/// Converts a YAML number, mapping non-finite floats to null.
fn yaml_number(number: &serde_yaml::Number) -> Value {
    if let Some(value) = number.as_i64() {
        return Value::Number(Number::from(value));
    }
    if let Some(value) = number.as_u64() {
        return Value::Number(Number::from(value));
    }
    number.as_f64().and_then(Number::from_f64).map_or(Value::Null, Value::Number)
}

/// Normalizes a scalar YAML mapping key to a string.
fn yaml_key(key: serde_yaml::Value) -> Result<String, DocumentError> {
    match key {
        serde_yaml::Value::String(text) => Ok(text),
        serde_yaml::Value::Number(number) => Ok(number.to_string()),
        serde_yaml::Value::Bool(flag) => Ok(flag.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => {
            Err(DocumentError::UnsupportedKey)
        }
    }
}

// ============================================================================
// SECTION: Traversal
// ============================================================================

/// Visits every mapping entry depth-first, stopping at the first entry the
/// visitor accepts. Returns true when the visitor accepted an entry.
pub fn any_entry<F>(document: &Document, visitor: &mut F) -> bool
where
    F: FnMut(&str, &Document) -> bool,
{
    match document {
        Value::Object(object) => {
            object.iter().any(|(key, value)| visitor(key, value) || any_entry(value, visitor))
        }
        Value::Array(items) => items.iter().any(|item| any_entry(item, visitor)),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => false,
    }
}

/// Returns the truthiness of a document value (empty and zero values are falsy).
#[must_use]
pub fn is_truthy(value: &Document) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => {
            number.as_f64().is_some_and(|value| value.classify() != FpCategory::Zero)
        }
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(object) => !object.is_empty(),
    }
}

/// Returns the string content when the value is a string with non-blank text.
#[must_use]
pub fn non_blank_str(value: &Document) -> Option<&str> {
    value.as_str().filter(|text| !text.trim().is_empty())
}
