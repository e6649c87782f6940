// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification errors.
//!
//! The gate never shows these to callers. Every variant collapses into the
//! same sign-in redirect; the variant only reaches the logs.

/// Why a session token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No verifier is configured; every token is rejected.
    #[error("token verification is not configured")]
    NotConfigured,
    /// Token is not a decodable JWT
    #[error("token is malformed")]
    MalformedToken,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    TokenExpired,
    #[error("token is not yet valid")]
    TokenNotYetValid,
    #[error("token issuer is invalid")]
    InvalidIssuer,
    #[error("token audience is invalid")]
    InvalidAudience,
    /// The key set endpoint could not be reached or returned garbage.
    #[error("failed to fetch key set: {0}")]
    KeySetUnavailable(String),
    /// No key in the key set matches the token's `kid`.
    #[error("no matching key in key set")]
    NoMatchingKey,
    #[error("unsupported key: {0}")]
    UnsupportedKey(String),
}

impl AuthError {
    /// Short machine-readable reason for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::NotConfigured => "not_configured",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::KeySetUnavailable(_) => "key_set_unavailable",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::UnsupportedKey(_) => "unsupported_key",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            _ => AuthError::MalformedToken,
        }
    }
}
