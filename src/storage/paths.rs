// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Object key layout for backing objects and backup snapshots.
//!
//! ```text
//! content/
//!   news.json
//!   impact.json
//!   team.json
//!   magazines.json
//!   samples.json
//!   requests.json
//! backups/
//!   {collection}/{UTC timestamp}.json
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::codec::CollectionKind;

/// Prefix for live backing objects.
pub const CONTENT_PREFIX: &str = "content";

/// Default prefix for backup snapshots.
pub const DEFAULT_BACKUP_PREFIX: &str = "backups";

/// Maps each collection to its object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionKeys {
    overrides: HashMap<CollectionKind, String>,
    backup_prefix: String,
}

impl Default for CollectionKeys {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            backup_prefix: DEFAULT_BACKUP_PREFIX.to_string(),
        }
    }
}

impl CollectionKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `kind` at a custom object key. Blank keys are ignored.
    pub fn with_key(mut self, kind: CollectionKind, key: impl Into<String>) -> Self {
        let key = key.into().trim().trim_start_matches('/').to_string();
        if !key.is_empty() {
            self.overrides.insert(kind, key);
        }
        self
    }

    /// Use a custom prefix for backup snapshots.
    pub fn with_backup_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim().trim_matches('/').to_string();
        if !prefix.is_empty() {
            self.backup_prefix = prefix;
        }
        self
    }

    /// Object key of the live backing object.
    pub fn object_key(&self, kind: CollectionKind) -> String {
        self.overrides
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| format!("{CONTENT_PREFIX}/{}.json", kind.name()))
    }

    /// Object key for a backup snapshot taken at `at` for the write tagged `tag`.
    ///
    /// The tag keeps snapshots taken within the same millisecond apart.
    /// Colons are avoided so keys stay valid file names on every platform.
    pub fn backup_key(&self, kind: CollectionKind, at: DateTime<Utc>, tag: &str) -> String {
        format!(
            "{}/{}/{}-{tag}.json",
            self.backup_prefix,
            kind.name(),
            at.format("%Y-%m-%dT%H-%M-%S%.3fZ")
        )
    }
}
