// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public magazine request intake.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::info;

use super::drafts::is_present_string;
use super::{DocumentRepository, RepositoryError, RepositoryResult};
use crate::codec::{CollectionKind, Record};

/// Optional free-text fields, trimmed and dropped when blank.
const OPTIONAL_FIELDS: [&str; 5] = ["phone", "organization", "municipality", "magazineCode", "message"];

/// Validates and appends magazine requests.
#[derive(Clone)]
pub struct MagazineRequestIntake {
    repository: DocumentRepository,
}

impl MagazineRequestIntake {
    pub fn new(repository: DocumentRepository) -> Self {
        Self { repository }
    }

    /// Store one request and return the stored record.
    pub async fn submit(&self, payload: &Value, now: DateTime<Utc>) -> RepositoryResult<Record> {
        let item = build_request(payload, now)?;
        let record = self
            .repository
            .append(CollectionKind::Requests, item)
            .await?;
        info!(request_id = %record.id, "Magazine request stored");
        Ok(record)
    }
}

fn build_request(payload: &Value, now: DateTime<Utc>) -> RepositoryResult<Map<String, Value>> {
    let Some(fields) = payload.as_object() else {
        return Err(RepositoryError::Validation(vec![
            "request must be a JSON object".to_string(),
        ]));
    };

    let mut problems = Vec::new();
    if !is_present_string(fields.get("fullName")) {
        problems.push("fullName is required".to_string());
    }
    match fields.get("email").and_then(Value::as_str).map(str::trim) {
        Some(email) if email.contains('@') => {}
        Some(email) if !email.is_empty() => problems.push("email is invalid".to_string()),
        _ => problems.push("email is required".to_string()),
    }
    let quantity = match fields.get("quantity") {
        None | Some(Value::Null) => 1,
        Some(value) => match value.as_u64().filter(|q| *q > 0) {
            Some(q) => q,
            None => {
                problems.push("quantity must be a positive integer".to_string());
                0
            }
        },
    };
    if !problems.is_empty() {
        return Err(RepositoryError::Validation(problems));
    }

    let mut item = fields.clone();
    item.remove("order");
    item.remove("visible");
    item.insert("id".into(), Value::String(request_id(now)));
    for name in ["fullName", "email"] {
        if let Some(Value::String(s)) = fields.get(name) {
            item.insert(name.into(), Value::String(s.trim().to_string()));
        }
    }
    for name in OPTIONAL_FIELDS {
        if let Some(Value::String(s)) = fields.get(name) {
            let s = s.trim();
            if s.is_empty() {
                item.remove(name);
            } else {
                item.insert(name.into(), Value::String(s.to_string()));
            }
        }
    }
    item.insert("quantity".into(), Value::from(quantity));
    item.insert("status".into(), Value::String("new".into()));
    item.insert(
        "createdAt".into(),
        Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Ok(item)
}

/// `request-{unix millis}-{8 random hex}`.
fn request_id(now: DateTime<Utc>) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("request-{}-{}", now.timestamp_millis(), &random[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CollectionKeys, MemoryBlobStore};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn intake() -> (MagazineRequestIntake, DocumentRepository, Arc<MemoryBlobStore>) {
        let store = Arc::new(MemoryBlobStore::new());
        let repo = DocumentRepository::new(Some(store.clone()), CollectionKeys::default());
        (MagazineRequestIntake::new(repo.clone()), repo, store)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn stores_request_with_defaults() {
        let (intake, repo, _store) = intake();
        let record = intake
            .submit(
                &json!({
                    "fullName": " Joana ",
                    "email": "joana@example.org",
                    "organization": "EBF Becora",
                    "message": "",
                    "school": "EBF Becora",
                    "grade": 5,
                    "status": "shipped",
                    "id": "chosen-by-client"
                }),
                now(),
            )
            .await
            .unwrap();

        assert!(record.id.starts_with(&format!("request-{}-", now().timestamp_millis())));
        assert_eq!(record.fields["fullName"], json!("Joana"));
        assert_eq!(record.fields["status"], json!("new"));
        assert_eq!(record.fields["quantity"], json!(1));
        assert_eq!(record.fields["organization"], json!("EBF Becora"));
        assert!(record.fields.get("message").is_none());
        assert_eq!(record.fields["school"], json!("EBF Becora"));
        assert_eq!(record.fields["grade"], json!(5));
        assert_eq!(record.fields["createdAt"], json!("2026-10-15T10:00:00.000Z"));

        let stored = repo.list(CollectionKind::Requests).await.unwrap();
        assert_eq!(stored, vec![record]);
    }

    #[tokio::test]
    async fn requests_accumulate_in_arrival_order() {
        let (intake, repo, _store) = intake();
        for name in ["A", "B", "C"] {
            intake
                .submit(&json!({ "fullName": name, "email": "x@y.z" }), now())
                .await
                .unwrap();
        }
        let names: Vec<Value> = repo
            .list(CollectionKind::Requests)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.fields["fullName"].clone())
            .collect();
        assert_eq!(names, vec![json!("A"), json!("B"), json!("C")]);
    }

    #[tokio::test]
    async fn invalid_requests_are_not_stored() {
        let (intake, _repo, store) = intake();
        let err = intake
            .submit(&json!({ "fullName": "A", "email": "nope", "quantity": 0 }), now())
            .await
            .unwrap_err();
        let RepositoryError::Validation(problems) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            problems,
            vec![
                "email is invalid".to_string(),
                "quantity must be a positive integer".to_string()
            ]
        );
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_email_is_reported() {
        let (intake, _repo, _store) = intake();
        let err = intake
            .submit(&json!({ "fullName": "A" }), now())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("email is required"));
    }
}
