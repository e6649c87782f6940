// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Field-level normalization helpers shared by every collection.
//!
//! None of these fail: malformed optional values fall back to defaults.

use serde_json::{Map, Value};

/// Default for English titles that are missing or blank.
pub const UNTITLED: &str = "Untitled";

/// Trimmed explicit identifier, if the item carries a non-blank string `id`.
pub fn identifier(raw: &Map<String, Value>) -> Option<String> {
    raw.get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Explicit numeric `order`, else the 1-based position.
pub fn order(raw: &Map<String, Value>, index: usize) -> i64 {
    match raw.get("order") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(index as i64 + 1),
        _ => index as i64 + 1,
    }
}

/// Visible unless explicitly `false`.
pub fn visible(raw: &Map<String, Value>) -> bool {
    !matches!(raw.get("visible"), Some(Value::Bool(false)))
}

/// Scalar coerced to a string; objects, arrays and null yield `None`.
fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Set an always-present string field, defaulting to `default`.
pub fn set_text(raw: &Map<String, Value>, out: &mut Map<String, Value>, name: &str, default: &str) {
    let value = scalar_string(raw.get(name)).unwrap_or_else(|| default.to_string());
    out.insert(name.to_string(), Value::String(value));
}

/// Set an English title; blank values also take the default.
pub fn set_title(raw: &Map<String, Value>, out: &mut Map<String, Value>, name: &str) {
    let value = scalar_string(raw.get(name))
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    out.insert(name.to_string(), Value::String(value));
}

/// Keep an optional field only when the input is a string.
pub fn keep_optional_text(raw: &Map<String, Value>, out: &mut Map<String, Value>, name: &str) {
    match raw.get(name) {
        Some(Value::String(s)) => {
            out.insert(name.to_string(), Value::String(s.clone()));
        }
        _ => {
            out.remove(name);
        }
    }
}

/// Normalize a bilingual pair: `{base}En` always a string, `{base}Tet` kept
/// only when it was a string.
pub fn set_bilingual(
    raw: &Map<String, Value>,
    out: &mut Map<String, Value>,
    base: &str,
    english_default: &str,
) {
    set_text(raw, out, &format!("{base}En"), english_default);
    keep_optional_text(raw, out, &format!("{base}Tet"));
}

/// Bilingual pair whose English side is a title.
pub fn set_bilingual_title(raw: &Map<String, Value>, out: &mut Map<String, Value>, base: &str) {
    set_title(raw, out, &format!("{base}En"));
    keep_optional_text(raw, out, &format!("{base}Tet"));
}

/// Normalize a single-image field plus its multi-image list.
///
/// The list keeps only non-empty strings. The single field is the explicit
/// non-empty value if given, else the first list entry. Both are retained.
pub fn set_images(raw: &Map<String, Value>, out: &mut Map<String, Value>, single: &str, multi: &str) {
    let list: Option<Vec<String>> = match raw.get(multi) {
        Some(Value::Array(values)) => Some(
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    };

    let explicit = raw
        .get(single)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let primary = explicit.or_else(|| list.as_ref().and_then(|l| l.first().cloned()));

    match primary {
        Some(image) => {
            out.insert(single.to_string(), Value::String(image));
        }
        None => {
            out.remove(single);
        }
    }

    match list {
        Some(list) => {
            out.insert(
                multi.to_string(),
                Value::Array(list.into_iter().map(Value::String).collect()),
            );
        }
        None => {
            out.remove(multi);
        }
    }
}

/// Trimmed natural key as a string (empty when absent).
pub fn set_key(raw: &Map<String, Value>, out: &mut Map<String, Value>, name: &str) {
    let key = scalar_string(raw.get(name))
        .map(|k| k.trim().to_string())
        .unwrap_or_default();
    out.insert(name.to_string(), Value::String(key));
}

/// Positive integer field from a number or numeric string, else `default`.
pub fn set_positive_int(raw: &Map<String, Value>, out: &mut Map<String, Value>, name: &str, default: i64) {
    let parsed = match raw.get(name) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    let value = parsed.filter(|v| *v > 0).unwrap_or(default);
    out.insert(name.to_string(), Value::from(value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn identifier_trims_and_ignores_non_strings() {
        assert_eq!(identifier(&map(json!({ "id": "  n-1 " }))), Some("n-1".to_string()));
        assert_eq!(identifier(&map(json!({ "id": "   " }))), None);
        assert_eq!(identifier(&map(json!({ "id": 5 }))), None);
    }

    #[test]
    fn order_defaults_to_position() {
        assert_eq!(order(&map(json!({})), 0), 1);
        assert_eq!(order(&map(json!({ "order": "3" })), 4), 5);
        assert_eq!(order(&map(json!({ "order": 7 })), 0), 7);
        assert_eq!(order(&map(json!({ "order": 2.9 })), 0), 2);
    }

    #[test]
    fn only_explicit_false_hides() {
        assert!(visible(&map(json!({}))));
        assert!(visible(&map(json!({ "visible": null }))));
        assert!(visible(&map(json!({ "visible": "false" }))));
        assert!(!visible(&map(json!({ "visible": false }))));
    }

    #[test]
    fn bilingual_english_always_present_tetum_only_when_string() {
        let raw = map(json!({ "bodyTet": 3, "summaryTet": "Sumáriu" }));
        let mut out = raw.clone();
        set_bilingual(&raw, &mut out, "body", "");
        set_bilingual(&raw, &mut out, "summary", "");
        assert_eq!(out["bodyEn"], json!(""));
        assert!(out.get("bodyTet").is_none());
        assert_eq!(out["summaryTet"], json!("Sumáriu"));
    }

    #[test]
    fn blank_title_becomes_untitled() {
        let raw = map(json!({ "titleEn": "  " }));
        let mut out = raw.clone();
        set_bilingual_title(&raw, &mut out, "title");
        assert_eq!(out["titleEn"], json!(UNTITLED));
    }

    #[test]
    fn images_filter_and_pick_primary() {
        let raw = map(json!({ "images": ["", " a.jpg ", null, "b.jpg"] }));
        let mut out = raw.clone();
        set_images(&raw, &mut out, "image", "images");
        assert_eq!(out["image"], json!("a.jpg"));
        assert_eq!(out["images"], json!(["a.jpg", "b.jpg"]));

        let raw = map(json!({ "image": "cover.jpg", "images": ["a.jpg"] }));
        let mut out = raw.clone();
        set_images(&raw, &mut out, "image", "images");
        assert_eq!(out["image"], json!("cover.jpg"));

        let raw = map(json!({ "image": "" }));
        let mut out = raw.clone();
        set_images(&raw, &mut out, "image", "images");
        assert!(out.get("image").is_none());
        assert!(out.get("images").is_none());
    }

    #[test]
    fn positive_int_accepts_numeric_strings() {
        let raw = map(json!({ "a": "4", "b": 0, "c": "x" }));
        let mut out = Map::new();
        set_positive_int(&raw, &mut out, "a", 1);
        set_positive_int(&raw, &mut out, "b", 1);
        set_positive_int(&raw, &mut out, "c", 1);
        assert_eq!(out["a"], json!(4));
        assert_eq!(out["b"], json!(1));
        assert_eq!(out["c"], json!(1));
    }
}
