// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Media Back-Office - Content Repository and Session Gateway
//!
//! Serves the JSON collections behind a bilingual public website (news,
//! impact stories, team, magazines, sample pages, magazine requests) from an
//! object store, and guards every admin mutation with a stateless token gate.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Session cookie, token verification and the role gate
//! - `codec` - Shape-agnostic decode and canonical encode of collections
//! - `storage` - Blob store backends and the document repository

pub mod api;
pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
