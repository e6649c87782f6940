// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Normalized record representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// One entity in a collection.
///
/// The core fields are typed; everything else (known bilingual fields after
/// normalization as well as unrecognized input) lives in `fields` and is
/// serialized alongside the core, so no input is ever discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Record {
    /// Stable identifier, never empty.
    pub id: String,
    /// Ordering hint (defaults to 1-based input position).
    pub order: i64,
    /// Public visibility. Only an explicit `false` hides a record.
    pub visible: bool,
    /// Collection-specific and passthrough fields.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// String value of a field, if present and a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Trimmed natural key, or `None` when absent or blank.
    pub fn natural_key(&self, key: &str) -> Option<&str> {
        self.str_field(key)
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Serialize to a JSON object (core fields first in the flattened map).
    pub fn to_value(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        object.insert("order".to_string(), Value::from(self.order));
        object.insert("visible".to_string(), Value::Bool(self.visible));
        Value::Object(object)
    }
}
