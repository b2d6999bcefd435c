//! Minimal JSON schema documents for generated archive files.

use ra_common::JsonType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON schema draft the generated documents declare.
pub const JSON_SCHEMA_DRAFT: &str = "http://json-schema.org/draft-07/schema#";

/// Schema of a single primitive property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonSchemaProperty {
    #[serde(rename = "type")]
    pub json_type: JsonType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl JsonSchemaProperty {
    pub fn primitive(json_type: JsonType, description: Option<String>) -> Self {
        Self {
            json_type,
            description,
        }
    }
}

/// Object schema with a flat set of primitive properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "$schema")]
    pub schema: String,

    #[serde(rename = "$id")]
    pub id: String,

    #[serde(rename = "type")]
    pub json_type: JsonType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub properties: BTreeMap<String, JsonSchemaProperty>,
}

impl JsonSchema {
    pub fn object(
        id: impl Into<String>,
        description: Option<String>,
        properties: BTreeMap<String, JsonSchemaProperty>,
    ) -> Self {
        Self {
            schema: JSON_SCHEMA_DRAFT.to_string(),
            id: id.into(),
            json_type: JsonType::Object,
            description,
            properties,
        }
    }

    /// Pretty-printed document bytes.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}
