// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory blob store.
//!
//! Holds objects in a `HashMap` behind a mutex and records every call in
//! order, so tests can assert that a backup snapshot lands before the live
//! object is rewritten.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::blob::{BlobError, BlobResult, BlobStore};

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(String),
    Put(String),
}

#[derive(Default)]
struct Inner {
    objects: HashMap<String, Vec<u8>>,
    calls: Vec<StoreCall>,
    fail_puts: bool,
}

/// HashMap-backed store with a call log.
#[derive(Default)]
pub struct MemoryBlobStore {
    inner: Mutex<Inner>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a call.
    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let mut inner = self.lock();
        inner.objects.insert(key.into(), bytes.into());
    }

    /// Current bytes for `key`, without recording a call.
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(key).cloned()
    }

    /// All stored keys starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Ordered log of every get/put since creation.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Make every subsequent `put` fail with a transport error.
    pub fn fail_puts(&self, fail: bool) {
        self.lock().fail_puts = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-call;
        // the map itself is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> BlobResult<Vec<u8>> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Get(key.to_string()));
        inner
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> BlobResult<()> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Put(key.to_string()));
        if inner.fail_puts {
            return Err(BlobError::Transport("simulated put failure".to_string()));
        }
        inner.objects.insert(key.to_string(), bytes);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
