// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the collection backing objects.
//!
//! [`DocumentRepository`] runs "read blob -> decode -> normalize -> (merge) ->
//! encode -> write blob" for any collection, parameterized by the
//! collection's codec. Every write fully overwrites the backing object;
//! there is no partial-update path.

pub mod drafts;
pub mod requests;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::codec::{CodecError, CollectionKind, MergeDiscipline, Record};
use crate::storage::{BlobError, BlobStore, CollectionKeys, JSON_CONTENT_TYPE};

pub use drafts::{DraftSubmissionPipeline, StorySubmission};
pub use requests::MagazineRequestIntake;

/// Errors from repository and intake operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No object store destination is configured; writes cannot proceed.
    #[error("storage is not configured")]
    NotConfigured,

    /// The stored object exists but is not valid JSON.
    #[error("stored {collection} data is corrupt: {source}")]
    CorruptDocument {
        collection: CollectionKind,
        #[source]
        source: CodecError,
    },

    /// The request body does not have the expected shape.
    #[error("{0}")]
    InvalidPayload(String),

    /// Required submission fields are missing or invalid.
    #[error("invalid submission: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The operation does not apply to this collection.
    #[error("{operation} is not supported for {collection}")]
    Unsupported {
        operation: &'static str,
        collection: CollectionKind,
    },

    /// Transport or service failure talking to the object store.
    #[error("object store error: {0}")]
    Store(#[from] BlobError),

    /// Serializing the outgoing document failed.
    #[error("failed to serialize {collection}: {source}")]
    Serialize {
        collection: CollectionKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Generic JSON-document repository over a blob store.
#[derive(Clone)]
pub struct DocumentRepository {
    store: Option<Arc<dyn BlobStore>>,
    keys: CollectionKeys,
}

impl DocumentRepository {
    /// Create a repository. `store` is `None` when no destination is configured.
    pub fn new(store: Option<Arc<dyn BlobStore>>, keys: CollectionKeys) -> Self {
        Self { store, keys }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub fn keys(&self) -> &CollectionKeys {
        &self.keys
    }

    /// Backend name, or `None` when unconfigured.
    pub fn backend(&self) -> Option<&'static str> {
        self.store.as_ref().map(|s| s.backend())
    }

    pub(crate) fn require_store(&self) -> RepositoryResult<&Arc<dyn BlobStore>> {
        self.store.as_ref().ok_or(RepositoryError::NotConfigured)
    }

    /// Raw bytes of the backing object; `None` when it does not exist.
    pub(crate) async fn read_raw(&self, kind: CollectionKind) -> RepositoryResult<Option<Vec<u8>>> {
        let store = self.require_store()?;
        let key = self.keys.object_key(kind);
        match store.get(&key).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => {
                error!(collection = %kind, key = %key, error = %e, "Failed to read backing object");
                Err(e.into())
            }
        }
    }

    /// Overwrite an object with `document`.
    pub(crate) async fn write_document(
        &self,
        kind: CollectionKind,
        key: &str,
        document: &Value,
    ) -> RepositoryResult<()> {
        let store = self.require_store()?;
        let bytes = serde_json::to_vec_pretty(document).map_err(|source| {
            RepositoryError::Serialize {
                collection: kind,
                source,
            }
        })?;
        store.put(key, bytes, JSON_CONTENT_TYPE).await.map_err(|e| {
            error!(collection = %kind, key = %key, error = %e, "Failed to write object");
            RepositoryError::from(e)
        })
    }

    async fn load(&self, kind: CollectionKind) -> RepositoryResult<Vec<Record>> {
        match self.read_raw(kind).await? {
            Some(bytes) => kind
                .codec()
                .decode_bytes(&bytes)
                .map_err(|source| RepositoryError::CorruptDocument {
                    collection: kind,
                    source,
                }),
            None => Ok(Vec::new()),
        }
    }

    async fn store_records(&self, kind: CollectionKind, records: &[Record]) -> RepositoryResult<()> {
        let key = self.keys.object_key(kind);
        let document = kind.codec().encode(records);
        self.write_document(kind, &key, &document).await?;
        info!(collection = %kind, key = %key, records = records.len(), "Collection written");
        Ok(())
    }

    /// Every record in stored order.
    ///
    /// A missing backing object is an empty collection. Without a configured
    /// store the read degrades to empty as well.
    pub async fn list(&self, kind: CollectionKind) -> RepositoryResult<Vec<Record>> {
        if !self.is_configured() {
            warn!(collection = %kind, "Storage not configured, serving empty collection");
            return Ok(Vec::new());
        }
        self.load(kind).await
    }

    /// Visible records sorted by `order` (stable for ties).
    pub async fn list_visible(&self, kind: CollectionKind) -> RepositoryResult<Vec<Record>> {
        let mut records: Vec<Record> = self
            .list(kind)
            .await?
            .into_iter()
            .filter(|r| r.visible)
            .collect();
        records.sort_by_key(|r| r.order);
        Ok(records)
    }

    /// Replace the whole collection with `items`.
    pub async fn replace(&self, kind: CollectionKind, items: &Value) -> RepositoryResult<Vec<Record>> {
        let items = expect_list(items)?;
        self.require_store()?;

        let records = kind.codec().normalize_items(items);
        self.store_records(kind, &records).await?;
        Ok(records)
    }

    /// Upsert `items` into the stored set by the collection's natural key.
    ///
    /// Stored records come first in their stored order; incoming records
    /// overwrite matching keys in place or are appended. Within one call a
    /// later duplicate key wins. Records without a key are dropped.
    pub async fn upsert(&self, kind: CollectionKind, items: &Value) -> RepositoryResult<Vec<Record>> {
        let MergeDiscipline::MergeByKey(key_field) = kind.discipline() else {
            return Err(RepositoryError::Unsupported {
                operation: "upsert",
                collection: kind,
            });
        };
        let items = expect_list(items)?;
        self.require_store()?;

        let incoming = kind.codec().normalize_items(items);
        let existing = self.load(kind).await?;

        let mut order: Vec<String> = Vec::new();
        let mut by_key: HashMap<String, Record> = HashMap::new();
        for record in existing.into_iter().chain(incoming) {
            let Some(key) = record.natural_key(key_field).map(str::to_string) else {
                continue;
            };
            if by_key.insert(key.clone(), record).is_none() {
                order.push(key);
            }
        }

        let merged: Vec<Record> = order
            .into_iter()
            .filter_map(|key| by_key.remove(&key))
            .collect();

        self.store_records(kind, &merged).await?;
        Ok(merged)
    }

    /// Write `items` using the collection's merge discipline.
    pub async fn save(&self, kind: CollectionKind, items: &Value) -> RepositoryResult<Vec<Record>> {
        match kind.discipline() {
            MergeDiscipline::ReplaceAll => self.replace(kind, items).await,
            MergeDiscipline::MergeByKey(_) => self.upsert(kind, items).await,
            MergeDiscipline::Append => Err(RepositoryError::Unsupported {
                operation: "bulk write",
                collection: kind,
            }),
        }
    }

    /// Remove the record with natural key `key` from a merge-by-key collection.
    pub async fn remove(&self, kind: CollectionKind, key: &str) -> RepositoryResult<Vec<Record>> {
        let MergeDiscipline::MergeByKey(key_field) = kind.discipline() else {
            return Err(RepositoryError::Unsupported {
                operation: "delete",
                collection: kind,
            });
        };
        self.require_store()?;

        let wanted = key.trim();
        let remaining: Vec<Record> = self
            .load(kind)
            .await?
            .into_iter()
            .filter(|r| matches!(r.natural_key(key_field), Some(k) if k != wanted))
            .collect();

        self.store_records(kind, &remaining).await?;
        Ok(remaining)
    }

    /// Append one raw record to the end of the collection.
    pub async fn append(&self, kind: CollectionKind, item: Map<String, Value>) -> RepositoryResult<Record> {
        self.require_store()?;

        let mut records = self.load(kind).await?;
        let record = kind.codec().normalize(&item, records.len());
        records.push(record.clone());

        self.store_records(kind, &records).await?;
        Ok(record)
    }
}

fn expect_list(items: &Value) -> RepositoryResult<&[Value]> {
    items
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| RepositoryError::InvalidPayload("expected a list of records".to_string()))
}
