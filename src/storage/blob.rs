// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blob store contract.
//!
//! The only I/O boundary of the content core: opaque get/put of a named byte
//! object. Implementations must not retry and must not cache; every
//! repository operation re-reads the whole object.

use async_trait::async_trait;

/// Content type written for every JSON backing object and snapshot.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Errors from a blob store backend.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The object does not exist. Callers usually treat this as "empty".
    #[error("object not found: {0}")]
    NotFound(String),

    /// The key cannot be mapped onto the backend (e.g. escapes the root).
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    /// The backend answered with an unexpected status.
    #[error("object store returned HTTP {status} for {key}")]
    Status { key: String, status: u16 },

    /// Transport or service failure, surfaced unchanged.
    #[error("object store transport error: {0}")]
    Transport(String),

    /// Local filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlobError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound(_))
    }
}

/// Result alias for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;

/// Opaque named-object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the whole object. Missing objects yield [`BlobError::NotFound`].
    async fn get(&self, key: &str) -> BlobResult<Vec<u8>>;

    /// Overwrite the whole object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> BlobResult<()>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
