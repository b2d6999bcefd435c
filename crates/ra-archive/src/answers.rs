//! Flattened answers document.
//!
//! Every answer in the result tree is reduced to one scalar (or opaque object)
//! keyed by its step path with `/` replaced by `_`. The collected values are
//! written as `answers.json` together with a schema describing each key's
//! type and question prompt.

use ra_common::{AnswerResult, AnswerType, JsonType, StepPath};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

use crate::schema::{JsonSchema, JsonSchemaProperty};

/// Name of the answers document within the archive.
pub const ANSWERS_FILE_NAME: &str = "answers.json";

/// Name of the schema describing the answers document.
pub const ANSWERS_SCHEMA_FILE_NAME: &str = "answers_schema.json";

/// One answer reduced to its archived form.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatAnswer {
    /// Archived value; `None` is written as JSON `null`.
    pub value: Option<Value>,
    /// Type recorded in the answers schema.
    pub json_type: JsonType,
}

/// Reduce an answer to its archived value and type.
///
/// Returns `None` when the answer cannot be represented:
/// - no declared type and no value, or a `null` base type
/// - an explicit JSON `null` value
/// - a non-finite floating value
///
/// Arrays are joined into a comma-separated string and typed `string`.
pub fn flatten_answer(answer: &AnswerResult) -> Option<FlatAnswer> {
    let base_type = answer
        .answer_type
        .as_ref()
        .map(AnswerType::base_type)
        .or_else(|| answer.value.as_ref().map(JsonType::of))?;
    if base_type == JsonType::Null {
        return None;
    }

    let Some(value) = answer.value.as_ref() else {
        let json_type = if base_type == JsonType::Array {
            JsonType::String
        } else {
            base_type
        };
        return Some(FlatAnswer {
            value: None,
            json_type,
        });
    };

    let (value, json_type) = match value {
        Value::Bool(_) | Value::String(_) | Value::Object(_) => (value.clone(), base_type),
        Value::Number(n) if n.is_i64() || n.is_u64() => (value.clone(), base_type),
        Value::Number(n) => {
            let normalized = n.as_f64().and_then(Number::from_f64)?;
            (Value::Number(normalized), base_type)
        }
        Value::Array(items) => {
            let joined = items.iter().map(element_text).collect::<Vec<_>>().join(",");
            (Value::String(joined), JsonType::String)
        }
        Value::Null => return None,
    };

    Some(FlatAnswer {
        value: Some(value),
        json_type,
    })
}

/// Default textual form of an array element.
fn element_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Answers gathered during one archive build.
#[derive(Debug, Clone, Default)]
pub struct AnswersCollector {
    values: BTreeMap<String, Value>,
    properties: BTreeMap<String, JsonSchemaProperty>,
}

impl AnswersCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the answer found at `path`.
    ///
    /// Returns false when the answer was skipped. A later answer with the same
    /// key replaces an earlier one.
    pub fn record(&mut self, path: &StepPath, answer: &AnswerResult) -> bool {
        let Some(flat) = flatten_answer(answer) else {
            return false;
        };
        let key = path.to_answer_key();
        self.values
            .insert(key.clone(), flat.value.unwrap_or(Value::Null));
        self.properties.insert(
            key,
            JsonSchemaProperty::primitive(flat.json_type, answer.question_text.clone()),
        );
        true
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn property(&self, key: &str) -> Option<&JsonSchemaProperty> {
        self.properties.get(key)
    }

    /// Pretty-printed, key-sorted document. Slashes are not escaped.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.values)
    }

    /// Schema describing the answers document.
    pub fn schema(&self, description: &str) -> JsonSchema {
        JsonSchema::object(
            ANSWERS_SCHEMA_FILE_NAME,
            Some(description.to_string()),
            self.properties.clone(),
        )
    }
}
