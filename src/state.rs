// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{Gate, SessionCookie, TokenVerifier};
use crate::config::{AppConfig, ConfigError};
use crate::storage::{BlobStore, DocumentRepository, DraftSubmissionPipeline, MagazineRequestIntake};

/// Shared handles for request handlers. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repository: DocumentRepository,
    pub drafts: DraftSubmissionPipeline,
    pub requests: MagazineRequestIntake,
    pub verifier: TokenVerifier,
    pub cookie: SessionCookie,
    pub gate: Gate,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Option<Arc<dyn BlobStore>>,
        verifier: TokenVerifier,
    ) -> Self {
        let repository = DocumentRepository::new(store, config.keys.clone());
        let cookie = config.session_cookie();
        let gate = Gate::new(config.gate.clone(), verifier.clone(), cookie.clone());
        Self {
            drafts: DraftSubmissionPipeline::new(repository.clone()),
            requests: MagazineRequestIntake::new(repository.clone()),
            repository,
            verifier,
            cookie,
            gate,
            config: Arc::new(config),
        }
    }

    /// Build the store and verifier the configuration names.
    pub fn from_config(config: AppConfig) -> Result<Self, ConfigError> {
        let store = config.build_store()?;
        let verifier = config.build_verifier()?;
        Ok(Self::new(config, store, verifier))
    }
}
