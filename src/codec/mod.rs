// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Collection Codec
//!
//! Turns an arbitrary JSON backing object into a typed record list and back.
//!
//! ## Decode contract
//!
//! 1. The document shape is classified in a fixed order (see [`DocumentShape`]):
//!    bare array, then `{ "items": [...] }`, then the collection's own named
//!    field (`news`, `stories`, `members`). Anything else decodes to an empty
//!    list.
//! 2. Every object item is normalized into a [`Record`]: identifier, order and
//!    visibility are always present, collection-specific known fields get
//!    their defaults, and every unknown field is carried through untouched.
//!    Non-object items are skipped.
//! 3. Only a top-level JSON syntax error fails the decode.
//!
//! ## Encode contract
//!
//! Writes are always canonical: `{ "members": [...] }` for the team
//! collection, `{ "items": [...] }` for everything else. Decoding an encoded
//! document and encoding it again is a no-op.

pub mod collections;
pub mod fields;
pub mod record;
pub mod shape;

use serde_json::{Map, Value};

pub use collections::CollectionKind;
pub use record::Record;
pub use shape::DocumentShape;

/// Whole-document decode failure.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("backing object is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// How incoming writes combine with the stored list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDiscipline {
    /// The incoming list replaces the stored list.
    ReplaceAll,
    /// Incoming records upsert into the stored set by a natural key.
    MergeByKey(&'static str),
    /// Single records are appended by public submissions.
    Append,
}

/// Per-collection parse/normalize/serialize rules.
pub trait CollectionCodec: Send + Sync {
    fn kind(&self) -> CollectionKind;

    /// Write the collection's known fields into `out`, reading from `raw`.
    ///
    /// `out` already holds a copy of `raw` minus the core fields, so
    /// implementations only insert (or remove) what they normalize.
    fn normalize_fields(&self, raw: &Map<String, Value>, out: &mut Map<String, Value>);

    /// Identifier to use when the item carries none, before falling back to
    /// `{prefix}-{index}`.
    fn derived_id(&self, _fields: &Map<String, Value>) -> Option<String> {
        None
    }

    /// Normalize one raw item found at `index` in the input list.
    fn normalize(&self, raw: &Map<String, Value>, index: usize) -> Record {
        let mut out = raw.clone();
        out.remove("id");
        out.remove("order");
        out.remove("visible");
        self.normalize_fields(raw, &mut out);

        let id = fields::identifier(raw)
            .or_else(|| self.derived_id(&out))
            .unwrap_or_else(|| format!("{}-{index}", self.kind().id_prefix()));

        Record {
            id,
            order: fields::order(raw, index),
            visible: fields::visible(raw),
            fields: out,
        }
    }

    /// Normalize a list of raw items, skipping anything that is not an object.
    fn normalize_items(&self, items: &[Value]) -> Vec<Record> {
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_object().map(|raw| self.normalize(raw, index)))
            .collect()
    }

    /// Decode an already-parsed backing document.
    fn decode(&self, document: &Value) -> Vec<Record> {
        let shape = DocumentShape::classify(document, self.kind().wrapper_fields());
        self.normalize_items(shape.items())
    }

    /// Parse and decode raw backing-object bytes.
    fn decode_bytes(&self, bytes: &[u8]) -> Result<Vec<Record>, CodecError> {
        let document: Value = serde_json::from_slice(bytes)?;
        Ok(self.decode(&document))
    }

    /// Canonical JSON document for `records`.
    fn encode(&self, records: &[Record]) -> Value {
        let items = records.iter().map(Record::to_value).collect();
        let mut document = Map::new();
        document.insert(
            self.kind().canonical_field().to_string(),
            Value::Array(items),
        );
        Value::Object(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_accepts_each_shape_in_order() {
        let codec = CollectionKind::News.codec();

        let bare = json!([{ "id": "a" }]);
        let items = json!({ "items": [{ "id": "b" }] });
        let named = json!({ "news": [{ "id": "c" }] });
        let both = json!({ "items": [{ "id": "items-wins" }], "news": [{ "id": "named" }] });

        assert_eq!(codec.decode(&bare)[0].id, "a");
        assert_eq!(codec.decode(&items)[0].id, "b");
        assert_eq!(codec.decode(&named)[0].id, "c");
        assert_eq!(codec.decode(&both)[0].id, "items-wins");
    }

    #[test]
    fn decode_unknown_shape_is_empty() {
        let codec = CollectionKind::News.codec();
        assert!(codec.decode(&json!({ "stories": [{ "id": "x" }] })).is_empty());
        assert!(codec.decode(&json!("not a list")).is_empty());
        assert!(codec.decode(&json!(null)).is_empty());
    }

    #[test]
    fn decode_bytes_rejects_invalid_json() {
        let codec = CollectionKind::Impact.codec();
        assert!(matches!(
            codec.decode_bytes(b"{ not json"),
            Err(CodecError::InvalidJson(_))
        ));
    }

    #[test]
    fn decode_skips_non_object_items_but_keeps_positions() {
        let codec = CollectionKind::News.codec();
        let records = codec.decode(&json!([1, { "titleEn": "Second" }]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "news-1");
        assert_eq!(records[0].order, 2);
    }

    #[test]
    fn encode_uses_canonical_field() {
        let team = CollectionKind::Team.codec();
        let news = CollectionKind::News.codec();

        let members = team.decode(&json!([{ "name": "Ana" }]));
        let encoded = team.encode(&members);
        assert!(encoded.get("members").is_some());
        assert!(encoded.get("items").is_none());

        let items = news.decode(&json!([{ "titleEn": "Hello" }]));
        assert!(news.encode(&items).get("items").is_some());
    }

    #[test]
    fn re_normalizing_a_canonical_document_changes_nothing() {
        for kind in CollectionKind::ALL {
            let codec = kind.codec();
            let raw = json!({
                "items": [
                    { "titleEn": 7, "titleTet": null, "images": ["", "a.jpg", 3], "extra": { "k": 1 } },
                    { "id": "  keep  ", "order": 9.7, "visible": "no", "code": " M-1 " },
                    { "visible": false, "quantity": "2", "bodyTet": "Testu" }
                ],
                "members": [{ "name": "Ana", "roleTet": 5 }]
            });

            let first = codec.decode(&raw);
            let encoded = codec.encode(&first);
            let second = codec.decode(&encoded);

            assert_eq!(first, second, "{kind:?} is not idempotent");
            assert_eq!(codec.encode(&second), encoded);
        }
    }
}
