// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Draft submission pipeline for public story intake.
//!
//! Unauthenticated visitors submit impact stories. Each submission becomes a
//! hidden draft at the top of the impact collection, pending editorial
//! fill-in. Before the live object is touched, its current bytes are copied
//! to a timestamped backup key; that snapshot is never read back by the
//! service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;
use utoipa::ToSchema;

use super::{DocumentRepository, RepositoryError, RepositoryResult};
use crate::codec::{CollectionKind, DocumentShape};

/// Required non-empty string fields of a story submission.
const REQUIRED_FIELDS: [&str; 5] = ["fullName", "email", "suco", "municipality", "storySummary"];

/// Public story submission body (documentation schema).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorySubmission {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Village (suco) the story comes from.
    pub suco: String,
    pub municipality: String,
    pub story_summary: String,
    /// Must be exactly `true`.
    pub permissions_confirmed: bool,
}

/// Snapshot-then-prepend intake into one collection.
#[derive(Clone)]
pub struct DraftSubmissionPipeline {
    repository: DocumentRepository,
    collection: CollectionKind,
}

impl DraftSubmissionPipeline {
    pub fn new(repository: DocumentRepository) -> Self {
        Self {
            repository,
            collection: CollectionKind::Impact,
        }
    }

    pub fn collection(&self) -> CollectionKind {
        self.collection
    }

    /// Validate, back up, and prepend a draft. Returns the draft id.
    pub async fn submit(&self, payload: &Value, now: DateTime<Utc>) -> RepositoryResult<String> {
        let fields = validate(payload)?;
        let store = self.repository.require_store()?;
        let kind = self.collection;

        let id = draft_id(now);
        let draft = build_draft(&id, fields, now);

        let current = self.repository.read_raw(kind).await?;
        let document = match &current {
            Some(bytes) => serde_json::from_slice::<Value>(bytes).map_err(|e| {
                RepositoryError::CorruptDocument {
                    collection: kind,
                    source: e.into(),
                }
            })?,
            None => Value::Array(Vec::new()),
        };

        // The snapshot must land before the live object changes.
        let backup_key = self.repository.keys().backup_key(kind, now, &id);
        let snapshot = current.unwrap_or_else(|| b"[]".to_vec());
        store
            .put(&backup_key, snapshot, crate::storage::JSON_CONTENT_TYPE)
            .await?;

        let updated = DocumentShape::classify(&document, kind.wrapper_fields()).prepend(draft);
        let live_key = self.repository.keys().object_key(kind);
        self.repository
            .write_document(kind, &live_key, &updated)
            .await?;

        info!(collection = %kind, draft_id = %id, backup = %backup_key, "Draft submission stored");
        Ok(id)
    }
}

/// Check required fields and consent. Returns the submission object.
pub fn validate(payload: &Value) -> RepositoryResult<&Map<String, Value>> {
    let Some(fields) = payload.as_object() else {
        return Err(RepositoryError::Validation(vec![
            "submission must be a JSON object".to_string(),
        ]));
    };

    let mut problems: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|name| !is_present_string(fields.get(**name)))
        .map(|name| format!("{name} is required"))
        .collect();

    if fields.get("permissionsConfirmed") != Some(&Value::Bool(true)) {
        problems.push("permissionsConfirmed must be true".to_string());
    }

    if problems.is_empty() {
        Ok(fields)
    } else {
        Err(RepositoryError::Validation(problems))
    }
}

pub(crate) fn is_present_string(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.trim().is_empty())
}

fn text(fields: &Map<String, Value>, name: &str) -> Value {
    match fields.get(name) {
        Some(Value::String(s)) => Value::String(s.trim().to_string()),
        _ => Value::Null,
    }
}

/// `story-{unix millis}-{8 random hex}`.
///
/// Not checked for uniqueness; collisions need two submissions in the same
/// millisecond drawing the same 32 random bits.
pub fn draft_id(now: DateTime<Utc>) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("story-{}-{}", now.timestamp_millis(), &random[..8])
}

fn build_draft(id: &str, fields: &Map<String, Value>, now: DateTime<Utc>) -> Value {
    let phone = match text(fields, "phone") {
        Value::String(s) if !s.is_empty() => Value::String(s),
        _ => Value::Null,
    };

    json!({
        "id": id,
        "status": "draft",
        "visible": false,
        "submittedAt": now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "submission": {
            "fullName": text(fields, "fullName"),
            "email": text(fields, "email"),
            "phone": phone,
            "storySummary": text(fields, "storySummary"),
            "permissionsConfirmed": true,
        },
        "location": {
            "suco": text(fields, "suco"),
            "municipality": text(fields, "municipality"),
        },
        "titleEn": "",
        "summaryEn": "",
        "bodyEn": "",
        "images": [],
    })
}
