// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims and the verified identity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::roles::RoleSet;

/// Claims read from a verified session token.
///
/// Standard claims are typed; everything else stays in `extra` so the role
/// claim name can be configured.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Who is behind a request that passed the gate.
///
/// Inserted into request extensions so handlers can attribute admin writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SessionIdentity {
    /// Token subject; empty when the issuer omits `sub`.
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub roles: RoleSet,
    /// Unix timestamp.
    pub expires_at: i64,
}

impl SessionIdentity {
    pub fn from_claims(claims: SessionClaims, roles_claim: &str) -> Self {
        let roles = RoleSet::from_claim(claims.extra.get(roles_claim));
        Self {
            subject: claims.sub.unwrap_or_default(),
            email: claims.email,
            roles,
            expires_at: claims.exp,
        }
    }
}
