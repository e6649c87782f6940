// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session cookie issuance, reading and clearing.
//!
//! Issuance only checks that the token looks like a JWT. Nothing is stored
//! server-side; the gate verifies the cookie on every protected request.

use axum::http::{header, HeaderMap, HeaderValue};

/// Default session cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "admin_session";

/// Fixed cookie lifetime (1 hour).
pub const SESSION_TTL_SECS: u64 = 3600;

/// Cookie attributes for the admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    secure: bool,
}

impl Default for SessionCookie {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME, false)
    }
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            secure,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Set-Cookie` value carrying `token`.
    ///
    /// Returns `None` when the token fails the shape check or contains bytes
    /// that cannot appear in a header.
    pub fn issue(&self, token: &str) -> Option<HeaderValue> {
        let token = token.trim();
        if !is_plausible_token(token) {
            return None;
        }
        HeaderValue::from_str(&self.render(token, SESSION_TTL_SECS)).ok()
    }

    /// `Set-Cookie` value that expires the cookie immediately.
    pub fn clear(&self) -> HeaderValue {
        HeaderValue::from_str(&self.render("", 0))
            .unwrap_or_else(|_| HeaderValue::from_static("admin_session=; Path=/; Max-Age=0"))
    }

    fn render(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// The session token from the request's `Cookie` headers, if non-empty.
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Three non-empty dot-separated segments. Says nothing about validity.
pub fn is_plausible_token(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3 && segments.iter().all(|s| !s.is_empty())
}
