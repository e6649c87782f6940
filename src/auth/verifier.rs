// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stateless session token verification.

use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, Validation};

use super::claims::{SessionClaims, SessionIdentity};
use super::error::AuthError;
use super::jwks::KeyResolver;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Default claim carrying role names.
pub const DEFAULT_ROLES_CLAIM: &str = "groups";

/// Verifies signature, issuer, audience and expiry of a session token.
///
/// A verifier built with [`TokenVerifier::disabled`] rejects everything, so a
/// deployment without identity provider settings fails closed.
#[derive(Clone)]
pub struct TokenVerifier {
    resolver: Option<Arc<dyn KeyResolver>>,
    issuer: String,
    audience: Option<String>,
    roles_claim: String,
}

impl TokenVerifier {
    pub fn new(resolver: Arc<dyn KeyResolver>, issuer: impl Into<String>) -> Self {
        Self {
            resolver: Some(resolver),
            issuer: issuer.into(),
            audience: None,
            roles_claim: DEFAULT_ROLES_CLAIM.to_string(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            resolver: None,
            issuer: String::new(),
            audience: None,
            roles_claim: DEFAULT_ROLES_CLAIM.to_string(),
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_roles_claim(mut self, claim: impl Into<String>) -> Self {
        self.roles_claim = claim.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.resolver.is_some()
    }

    pub fn resolver(&self) -> Option<&Arc<dyn KeyResolver>> {
        self.resolver.as_ref()
    }

    /// Verify `token` and extract the caller's identity.
    pub async fn verify(&self, token: &str) -> Result<SessionIdentity, AuthError> {
        let resolver = self.resolver.as_ref().ok_or(AuthError::NotConfigured)?;

        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let resolved = resolver.resolve(header.kid.as_deref()).await?;
        if header.alg != resolved.algorithm {
            return Err(AuthError::InvalidSignature);
        }

        let mut validation = Validation::new(resolved.algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<SessionClaims>(token, &resolved.key, &validation)?;
        Ok(SessionIdentity::from_claims(data.claims, &self.roles_claim))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::jwks::StaticKeyResolver;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    pub(crate) const SECRET: &[u8] = b"test-signing-secret";
    pub(crate) const ISSUER: &str = "https://id.example.org";

    pub(crate) fn verifier() -> TokenVerifier {
        TokenVerifier::new(Arc::new(StaticKeyResolver::hmac(SECRET)), ISSUER)
    }

    pub(crate) fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    pub(crate) fn mint(claims: &Value) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    pub(crate) fn token_with_roles(roles: Value) -> String {
        mint(&json!({
            "sub": "user_1",
            "iss": ISSUER,
            "exp": now() + 600,
            "groups": roles
        }))
    }

    #[tokio::test]
    async fn valid_token_yields_identity() {
        let identity = verifier()
            .verify(&token_with_roles(json!(["Editor"])))
            .await
            .unwrap();
        assert_eq!(identity.subject, "user_1");
        assert!(identity.roles.contains("editor"));
    }

    #[tokio::test]
    async fn expired_token_is_rejected_past_leeway() {
        let token = mint(&json!({ "iss": ISSUER, "exp": now() - 3600 }));
        assert_eq!(verifier().verify(&token).await.unwrap_err(), AuthError::TokenExpired);

        let within_leeway = mint(&json!({ "iss": ISSUER, "exp": now() - 10 }));
        assert!(verifier().verify(&within_leeway).await.is_ok());
    }

    #[tokio::test]
    async fn wrong_issuer_is_rejected() {
        let token = mint(&json!({ "iss": "https://evil.example", "exp": now() + 600 }));
        assert_eq!(verifier().verify(&token).await.unwrap_err(), AuthError::InvalidIssuer);
    }

    #[tokio::test]
    async fn audience_is_checked_when_configured() {
        let token = mint(&json!({ "iss": ISSUER, "aud": "shop", "exp": now() + 600 }));
        assert!(verifier().verify(&token).await.is_ok());

        let strict = verifier().with_audience("backoffice");
        assert_eq!(strict.verify(&token).await.unwrap_err(), AuthError::InvalidAudience);
    }

    #[tokio::test]
    async fn forged_signature_is_rejected() {
        let token = token_with_roles(json!(["admin"]));
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        parts[1] = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&json!({
                "sub": "intruder",
                "iss": ISSUER,
                "exp": now() + 600,
                "groups": ["admin"]
            }))
            .unwrap(),
        );
        let forged = parts.join(".");
        assert_eq!(
            verifier().verify(&forged).await.unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[tokio::test]
    async fn garbage_and_disabled_are_rejected() {
        assert_eq!(
            verifier().verify("not-a-token").await.unwrap_err(),
            AuthError::MalformedToken
        );
        assert_eq!(
            TokenVerifier::disabled()
                .verify(&token_with_roles(json!(["admin"])))
                .await
                .unwrap_err(),
            AuthError::NotConfigured
        );
    }

    #[tokio::test]
    async fn custom_roles_claim() {
        let token = mint(&json!({ "iss": ISSUER, "exp": now() + 600, "roles": "admin" }));
        let identity = verifier().with_roles_claim("roles").verify(&token).await.unwrap();
        assert!(identity.roles.contains("admin"));
    }
}
