// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification key sources.
//!
//! ## Sources
//!
//! - [`JwksManager`] fetches the identity provider's published JWKS over
//!   HTTPS and caches it with a TTL. A token whose `kid` is missing from the
//!   cached set triggers one refetch, which covers key rotation. Forced
//!   refetches are spaced at least [`DEFAULT_MIN_REFRESH_INTERVAL`] apart and
//!   concurrent misses share a single fetch.
//! - [`StaticKeyResolver`] holds one fixed key (tests, pinned secrets).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum age of the cached set before an unknown `kid` may refetch it.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Timeout for one key set fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A decoding key plus the algorithm it verifies.
#[derive(Clone)]
pub struct ResolvedKey {
    pub key: DecodingKey,
    pub algorithm: Algorithm,
}

/// Looks up the key that should verify a token.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Key for the token header's `kid`, or any usable key when absent.
    async fn resolve(&self, kid: Option<&str>) -> Result<ResolvedKey, AuthError>;

    /// Readiness probe. Fixed keys are always ready.
    async fn check(&self) -> Result<(), AuthError> {
        Ok(())
    }

    fn source(&self) -> &'static str;
}

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Remote JWKS with caching.
#[derive(Clone)]
pub struct JwksManager {
    jwks_url: String,
    cache_ttl: Duration,
    min_refresh_interval: Duration,
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// Serializes fetches so concurrent misses do not stampede the endpoint.
    fetch_lock: Arc<Mutex<()>>,
    client: reqwest::Client,
}

impl JwksManager {
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::KeySetUnavailable(e.to_string()))?;
        Ok(Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            cache: Arc::new(RwLock::new(None)),
            fetch_lock: Arc::new(Mutex::new(())),
            client,
        })
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Cached set younger than `max_age`, if any.
    async fn cached_within(&self, max_age: Duration) -> Option<JwkSet> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < max_age)
            .map(|entry| entry.jwks.clone())
    }

    /// Return the cached set when younger than `max_age`, otherwise fetch.
    ///
    /// The cache is checked again after taking the fetch lock, so callers
    /// that queued behind an in-flight fetch reuse its result.
    async fn fetch_unless_fresh(&self, max_age: Duration) -> Result<JwkSet, AuthError> {
        if let Some(jwks) = self.cached_within(max_age).await {
            return Ok(jwks);
        }
        let _guard = self.fetch_lock.lock().await;
        if let Some(jwks) = self.cached_within(max_age).await {
            return Ok(jwks);
        }
        self.refresh().await
    }

    /// Cached key set, fetched when missing or stale.
    async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        self.fetch_unless_fresh(self.cache_ttl).await
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::KeySetUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeySetUnavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::KeySetUnavailable(e.to_string()))
    }

    /// Fetch the key set and replace the cache.
    pub async fn refresh(&self) -> Result<JwkSet, AuthError> {
        let jwks = self.fetch_jwks().await.inspect_err(|e| {
            warn!(url = %self.jwks_url, error = %e, "JWKS refresh failed");
        })?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        debug!(url = %self.jwks_url, keys = jwks.keys.len(), "JWKS refreshed");
        Ok(jwks)
    }

    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
    }
}

#[async_trait]
impl KeyResolver for JwksManager {
    async fn resolve(&self, kid: Option<&str>) -> Result<ResolvedKey, AuthError> {
        let jwks = self.get_jwks().await?;
        match select_key(&jwks, kid) {
            Ok(key) => Ok(key),
            Err(AuthError::NoMatchingKey) if kid.is_some() => {
                debug!(kid = ?kid, "Unknown key id, refetching JWKS unless fetched recently");
                let jwks = self.fetch_unless_fresh(self.min_refresh_interval).await?;
                select_key(&jwks, kid)
            }
            Err(e) => Err(e),
        }
    }

    async fn check(&self) -> Result<(), AuthError> {
        self.get_jwks().await.map(|_| ())
    }

    fn source(&self) -> &'static str {
        "jwks"
    }
}

/// Pick the key for `kid`, or the first usable key when the token has none.
fn select_key(jwks: &JwkSet, kid: Option<&str>) -> Result<ResolvedKey, AuthError> {
    match kid {
        Some(kid) => {
            let jwk = jwks
                .keys
                .iter()
                .find(|k| k.common.key_id.as_deref() == Some(kid))
                .ok_or(AuthError::NoMatchingKey)?;
            jwk_to_decoding_key(jwk)
        }
        None => jwks
            .keys
            .iter()
            .find_map(|jwk| jwk_to_decoding_key(jwk).ok())
            .ok_or(AuthError::NoMatchingKey),
    }
}

fn jwk_to_decoding_key(jwk: &Jwk) -> Result<ResolvedKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| AuthError::UnsupportedKey(format!("RSA key: {e}")))?;
            let algorithm = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                _ => Algorithm::RS256,
            };
            Ok(ResolvedKey { key, algorithm })
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| AuthError::UnsupportedKey(format!("EC key: {e}")))?;
            let algorithm = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };
            Ok(ResolvedKey { key, algorithm })
        }
        _ => Err(AuthError::UnsupportedKey(
            "only RSA and EC keys are accepted from a key set".to_string(),
        )),
    }
}

/// One fixed verification key.
#[derive(Clone)]
pub struct StaticKeyResolver {
    key: ResolvedKey,
}

impl StaticKeyResolver {
    pub fn new(key: DecodingKey, algorithm: Algorithm) -> Self {
        Self {
            key: ResolvedKey { key, algorithm },
        }
    }

    /// HS256 with a shared secret.
    pub fn hmac(secret: &[u8]) -> Self {
        Self::new(DecodingKey::from_secret(secret), Algorithm::HS256)
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(&self, _kid: Option<&str>) -> Result<ResolvedKey, AuthError> {
        Ok(self.key.clone())
    }

    fn source(&self) -> &'static str {
        "static"
    }
}
