// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the REST API. Every success body carries
//! `ok: true`; failures use [`crate::error::ErrorBody`].
//!
//! ## Collection envelope
//!
//! Collection reads and writes answer `{ "ok": true, "items": [...] }`, except
//! the team collection, which answers under `members`. The field name follows
//! the collection, so [`CollectionResponse`] serializes by hand.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use utoipa::ToSchema;

use crate::codec::{CollectionKind, Record};

// =============================================================================
// Collections
// =============================================================================

/// Records of one collection, keyed by the collection's canonical field.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResponse {
    pub kind: CollectionKind,
    pub records: Vec<Record>,
}

impl CollectionResponse {
    pub fn new(kind: CollectionKind, records: Vec<Record>) -> Self {
        Self { kind, records }
    }
}

impl Serialize for CollectionResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("ok", &true)?;
        map.serialize_entry(self.kind.canonical_field(), &self.records)?;
        map.end()
    }
}

/// Documentation shape of [`CollectionResponse`] (`members` for team).
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionEnvelope {
    pub ok: bool,
    pub items: Vec<Record>,
}

/// PUT body for a collection.
///
/// The list is read from the collection's canonical field (`members` for
/// team, `items` otherwise), then from `items`. A bare array is accepted too.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct WriteCollectionRequest(pub Value);

impl WriteCollectionRequest {
    pub fn into_items(self, kind: CollectionKind) -> Option<Value> {
        match self.0 {
            Value::Array(items) => Some(Value::Array(items)),
            Value::Object(mut fields) => fields
                .remove(kind.canonical_field())
                .or_else(|| fields.remove("items"))
                .filter(Value::is_array),
            _ => None,
        }
    }
}

// =============================================================================
// Public intake
// =============================================================================

/// Created draft or request identifier.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CreatedResponse {
    pub ok: bool,
    pub id: String,
}

impl CreatedResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            ok: true,
            id: id.into(),
        }
    }
}

/// Magazine request body (documentation schema).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MagazineRequestBody {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magazine_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Positive integer, default 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// Raw session token from the identity provider.
    pub token: String,
}

/// Cookie presence only; the token value is never echoed.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct SessionStatus {
    pub ok: bool,
    pub authenticated: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn new() -> Self {
        Self { ok: true }
    }
}

impl Default for OkResponse {
    fn default() -> Self {
        Self::new()
    }
}
