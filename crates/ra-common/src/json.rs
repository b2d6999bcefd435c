//! JSON typing for answer values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// JSON schema primitive type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Array,
    Object,
}

impl JsonType {
    /// The type of a concrete JSON value.
    ///
    /// Numbers representable as `i64`/`u64` are reported as `integer`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => JsonType::Integer,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }

    /// Schema name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Null => "null",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of an answer, as authored with the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AnswerType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Object,
    Array {
        #[serde(rename = "baseType")]
        base_type: JsonType,
        #[serde(rename = "sequenceSeparator", skip_serializing_if = "Option::is_none")]
        sequence_separator: Option<String>,
    },
    Measurement {
        #[serde(skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    DateTime {
        #[serde(rename = "codingFormat", skip_serializing_if = "Option::is_none")]
        coding_format: Option<String>,
    },
    Time {
        #[serde(rename = "codingFormat", skip_serializing_if = "Option::is_none")]
        coding_format: Option<String>,
    },
}

impl AnswerType {
    /// The JSON type an answer of this kind is stored as.
    pub fn base_type(&self) -> JsonType {
        match self {
            AnswerType::String | AnswerType::DateTime { .. } | AnswerType::Time { .. } => {
                JsonType::String
            }
            AnswerType::Number | AnswerType::Measurement { .. } => JsonType::Number,
            AnswerType::Integer => JsonType::Integer,
            AnswerType::Boolean => JsonType::Boolean,
            AnswerType::Null => JsonType::Null,
            AnswerType::Object => JsonType::Object,
            AnswerType::Array { .. } => JsonType::Array,
        }
    }
}
