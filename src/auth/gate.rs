// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role gate middleware for the protected path prefix.
//!
//! ## Decision
//!
//! | Request state | Outcome |
//! |---------------|---------|
//! | no cookie, or token fails verification | redirect to sign-in with `next` |
//! | verified, role set empty | redirect to the pending page |
//! | verified, no allowed role | redirect to the unauthorized page |
//! | verified, allowed role | pass through, response marked non-indexable |
//!
//! Every failure is a redirect. Verification failures are never told apart
//! to the caller; the reason is only logged.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::claims::SessionIdentity;
use super::roles::RoleSet;
use super::session::SessionCookie;
use super::verifier::TokenVerifier;

pub const DEFAULT_GATE_PREFIX: &str = "/admin";
pub const DEFAULT_ALLOWED_ROLES: &str = "admin,editor";
pub const DEFAULT_SIGN_IN_PATH: &str = "/auth";
pub const DEFAULT_PENDING_PATH: &str = "/auth/pending";
pub const DEFAULT_UNAUTHORIZED_PATH: &str = "/auth/unauthorized";

pub const X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");
pub const X_ADMIN_GATE: HeaderName = HeaderName::from_static("x-admin-gate");

/// Roles required below one path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRule {
    pub prefix: String,
    pub roles: RoleSet,
}

impl GateRule {
    /// Parse `prefix=role,role;prefix=role`.
    pub fn parse_list(s: &str) -> Result<Vec<GateRule>, String> {
        s.split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (prefix, roles) = entry
                    .split_once('=')
                    .ok_or_else(|| format!("rule '{entry}' is missing '='"))?;
                let prefix = normalize_prefix(prefix);
                if prefix.is_empty() {
                    return Err(format!("rule '{entry}' has an empty prefix"));
                }
                let roles = RoleSet::parse_list(roles);
                if roles.is_empty() {
                    return Err(format!("rule '{entry}' names no roles"));
                }
                Ok(GateRule { prefix, roles })
            })
            .collect()
    }
}

/// Rules applied when none are configured: team pages and team writes
/// below `prefix` need `admin`.
pub fn default_role_rules(prefix: &str) -> String {
    format!("{prefix}/team=admin;{prefix}/api/team=admin")
}

fn normalize_prefix(prefix: &str) -> String {
    prefix.trim().trim_end_matches('/').to_string()
}

/// Segment-aware prefix match: `/admin` covers `/admin/x` but not `/administrator`.
fn path_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Where the gate applies and whom it lets through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePolicy {
    pub prefix: String,
    pub allowed_roles: RoleSet,
    pub rules: Vec<GateRule>,
    pub sign_in_path: String,
    pub pending_path: String,
    pub unauthorized_path: String,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_GATE_PREFIX.to_string(),
            allowed_roles: RoleSet::parse_list(DEFAULT_ALLOWED_ROLES),
            rules: GateRule::parse_list(&default_role_rules(DEFAULT_GATE_PREFIX)).unwrap_or_default(),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            pending_path: DEFAULT_PENDING_PATH.to_string(),
            unauthorized_path: DEFAULT_UNAUTHORIZED_PATH.to_string(),
        }
    }
}

impl GatePolicy {
    pub fn covers(&self, path: &str) -> bool {
        path_under(path, &self.prefix)
    }

    /// Allowed roles for `path`; the longest matching rule wins.
    pub fn allowed_roles_for(&self, path: &str) -> &RoleSet {
        self.rules
            .iter()
            .filter(|rule| path_under(path, &rule.prefix))
            .max_by_key(|rule| rule.prefix.len())
            .map(|rule| &rule.roles)
            .unwrap_or(&self.allowed_roles)
    }

    /// Sign-in URL that returns to `target` afterwards.
    pub fn sign_in_url(&self, target: &str) -> String {
        let next: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("{}?next={}", self.sign_in_path, next)
    }
}

/// Outcome of gating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    SignIn,
    Pending,
    Unauthorized,
    Allow(SessionIdentity),
}

/// Everything the middleware needs.
#[derive(Clone)]
pub struct Gate {
    policy: Arc<GatePolicy>,
    verifier: TokenVerifier,
    cookie: SessionCookie,
}

impl Gate {
    pub fn new(policy: GatePolicy, verifier: TokenVerifier, cookie: SessionCookie) -> Self {
        Self {
            policy: Arc::new(policy),
            verifier,
            cookie,
        }
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    pub async fn decide(&self, headers: &HeaderMap, path: &str) -> GateDecision {
        let Some(token) = self.cookie.read(headers) else {
            debug!(path = %path, reason = "no_cookie", "Gate redirecting to sign-in");
            return GateDecision::SignIn;
        };

        let identity = match self.verifier.verify(&token).await {
            Ok(identity) => identity,
            Err(e) => {
                debug!(path = %path, reason = e.reason(), error = %e, "Gate redirecting to sign-in");
                return GateDecision::SignIn;
            }
        };

        if identity.roles.is_empty() {
            debug!(path = %path, subject = %identity.subject, "Gate: no roles, access pending");
            return GateDecision::Pending;
        }

        if !identity.roles.intersects(self.policy.allowed_roles_for(path)) {
            debug!(
                path = %path,
                subject = %identity.subject,
                roles = %identity.roles,
                "Gate: roles not allowed here"
            );
            return GateDecision::Unauthorized;
        }

        GateDecision::Allow(identity)
    }
}

/// Middleware applying [`Gate`] to every request under the policy prefix.
pub async fn role_gate(State(gate): State<Gate>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if !gate.policy.covers(&path) {
        return next.run(request).await;
    }

    match gate.decide(request.headers(), &path).await {
        GateDecision::Allow(identity) => {
            request.extensions_mut().insert(identity);
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                X_ROBOTS_TAG,
                HeaderValue::from_static("noindex, nofollow"),
            );
            headers.insert(X_ADMIN_GATE, HeaderValue::from_static("verified"));
            response
        }
        GateDecision::SignIn => {
            let target = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or(&path);
            Redirect::temporary(&gate.policy.sign_in_url(target)).into_response()
        }
        GateDecision::Pending => Redirect::temporary(&gate.policy.pending_path).into_response(),
        GateDecision::Unauthorized => {
            Redirect::temporary(&gate.policy.unauthorized_path).into_response()
        }
    }
}
