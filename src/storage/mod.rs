// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Blob Storage Module
//!
//! Every collection lives in one JSON backing object inside an object store.
//! This module provides the store contract and its backends.
//!
//! ## Backends
//!
//! - [`S3BlobStore`] - S3-compatible HTTP API (production)
//! - [`FsBlobStore`] - flat files under a root directory (single-node deployments)
//! - [`MemoryBlobStore`] - in-process map with a call log (tests, demos)
//!
//! ## Consistency
//!
//! There is no locking and no conditional write. Two writers to the same
//! object race and the last write wins.

pub mod blob;
pub mod fs_store;
pub mod memory;
pub mod paths;
pub mod repository;
pub mod s3;

pub use blob::{BlobError, BlobResult, BlobStore, JSON_CONTENT_TYPE};
pub use fs_store::FsBlobStore;
pub use memory::{MemoryBlobStore, StoreCall};
pub use paths::CollectionKeys;
pub use repository::{
    DocumentRepository, DraftSubmissionPipeline, MagazineRequestIntake, RepositoryError,
    RepositoryResult, StorySubmission,
};
pub use s3::{S3BlobStore, S3Config};
