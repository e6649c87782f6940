// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Backing-object shape classification.
//!
//! Stored documents come in several shapes. Classification tries, in order:
//!
//! 1. a bare JSON array;
//! 2. an object whose `items` field is an array;
//! 3. an object whose collection-specific named field (e.g. `members`) is an
//!    array, in the order the collection lists them.
//!
//! The first match wins. Any other document is [`DocumentShape::Unrecognized`].

use serde_json::{Map, Value};

/// Field every collection accepts before its own named wrappers.
pub const ITEMS_FIELD: &str = "items";

/// Classified backing document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentShape {
    /// `[...]`
    Array(Vec<Value>),
    /// `{ <field>: [...], ...rest }` with unknown top-level fields kept in `rest`.
    Wrapped {
        field: String,
        items: Vec<Value>,
        rest: Map<String, Value>,
    },
    /// Neither of the above.
    Unrecognized,
}

impl DocumentShape {
    /// Classify `document`, trying `items` and then each of `named_fields`.
    pub fn classify(document: &Value, named_fields: &[&str]) -> Self {
        match document {
            Value::Array(items) => DocumentShape::Array(items.clone()),
            Value::Object(object) => {
                let candidates = std::iter::once(ITEMS_FIELD).chain(named_fields.iter().copied());
                for field in candidates {
                    if let Some(Value::Array(items)) = object.get(field) {
                        let mut rest = object.clone();
                        rest.remove(field);
                        return DocumentShape::Wrapped {
                            field: field.to_string(),
                            items: items.clone(),
                            rest,
                        };
                    }
                }
                DocumentShape::Unrecognized
            }
            _ => DocumentShape::Unrecognized,
        }
    }

    /// Items in document order (empty when unrecognized).
    pub fn items(&self) -> &[Value] {
        match self {
            DocumentShape::Array(items) => items,
            DocumentShape::Wrapped { items, .. } => items,
            DocumentShape::Unrecognized => &[],
        }
    }

    /// Rebuild the document with `item` placed first, keeping the shape.
    ///
    /// An unrecognized document becomes a plain array holding only `item`.
    pub fn prepend(self, item: Value) -> Value {
        match self {
            DocumentShape::Array(items) => {
                let mut out = Vec::with_capacity(items.len() + 1);
                out.push(item);
                out.extend(items);
                Value::Array(out)
            }
            DocumentShape::Wrapped {
                field,
                items,
                mut rest,
            } => {
                let mut out = Vec::with_capacity(items.len() + 1);
                out.push(item);
                out.extend(items);
                rest.insert(field, Value::Array(out));
                Value::Object(rest)
            }
            DocumentShape::Unrecognized => Value::Array(vec![item]),
        }
    }
}
