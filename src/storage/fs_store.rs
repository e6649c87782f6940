// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Flat-file object store.
//!
//! Every object key maps to a file below a root directory. Keys use `/` as
//! the separator regardless of platform. Writes go to a temp file first and
//! are renamed into place, so readers never observe a half-written object.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::blob::{BlobError, BlobResult, BlobStore};

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all objects.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object key to a path under the root.
    ///
    /// Rejects empty keys, absolute keys and any `..` segment.
    pub fn object_path(&self, key: &str) -> BlobResult<PathBuf> {
        let trimmed = key.trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        let relative = Path::new(trimmed);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(BlobError::InvalidKey(key.to_string())),
            }
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, key: &str) -> BlobResult<Vec<u8>> {
        let path = self.object_path(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> BlobResult<()> {
        let path = self.object_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Unique temp name so two writers to the same key never share a file.
        let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        if let Err(e) = write_and_rename(&temp_path, &path, &bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(BlobError::Io(e));
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "fs"
    }
}

async fn write_and_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp_path, path).await
}
