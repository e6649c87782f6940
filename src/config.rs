// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! [`AppConfig`] is read once at startup and threaded into every component
//! through `AppState`. Nothing else reads the environment.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `APP_ENV` | `production` marks the session cookie `Secure` | `development` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; HTTPS when both are set | unset |
//! | `BLOB_STORE` | `s3`, `fs` or `memory` | unset (storage not configured) |
//! | `BLOB_FS_ROOT` | Root directory for `fs` | `./data` |
//! | `S3_ENDPOINT`, `S3_BUCKET`, `S3_ACCESS_KEY_ID`, `S3_SECRET_ACCESS_KEY` | Required for `s3` | - |
//! | `S3_REGION` | Signing region | `us-east-1` |
//! | `COLLECTION_KEY_<NAME>` | Object key for one collection | `content/<name>.json` |
//! | `BACKUP_PREFIX` | Prefix for backup snapshots | `backups` |
//! | `AUTH_JWKS_URL` | Identity provider JWKS endpoint | unset |
//! | `AUTH_HMAC_SECRET` | Shared HS256 secret, used when no JWKS URL is set | unset |
//! | `AUTH_ISSUER` | Expected `iss`; required with either key source | - |
//! | `AUTH_AUDIENCE` | Expected `aud` | not checked |
//! | `AUTH_ROLES_CLAIM` | Claim holding role names | `groups` |
//! | `GATE_PREFIX` | Protected path prefix; admin collection routes live at `<prefix>/api` | `/admin` |
//! | `GATE_ALLOWED_ROLES` | Roles allowed under the prefix | `admin,editor` |
//! | `GATE_ROLE_RULES` | `prefix=roles;...` overrides, longest prefix wins | `<prefix>/team=admin;<prefix>/api/team=admin` |
//! | `SIGN_IN_PATH`, `PENDING_PATH`, `UNAUTHORIZED_PATH` | Gate redirect targets | `/auth`, `/auth/pending`, `/auth/unauthorized` |
//! | `SESSION_COOKIE_NAME` | Session cookie name | `admin_session` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::gate::{
    default_role_rules, DEFAULT_ALLOWED_ROLES, DEFAULT_GATE_PREFIX, DEFAULT_PENDING_PATH,
    DEFAULT_SIGN_IN_PATH, DEFAULT_UNAUTHORIZED_PATH,
};
use crate::auth::session::DEFAULT_COOKIE_NAME;
use crate::auth::verifier::DEFAULT_ROLES_CLAIM;
use crate::auth::{
    GatePolicy, GateRule, JwksManager, KeyResolver, RoleSet, SessionCookie, StaticKeyResolver,
    TokenVerifier,
};
use crate::codec::CollectionKind;
use crate::storage::{BlobStore, CollectionKeys, FsBlobStore, MemoryBlobStore, S3BlobStore, S3Config};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
pub const DEFAULT_FS_ROOT: &str = "./data";
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Startup configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is required {context}")]
    Missing {
        var: &'static str,
        context: &'static str,
    },

    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },

    #[error("failed to initialize {component}: {reason}")]
    Init {
        component: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Which blob store backend to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// No destination: reads degrade to empty, writes fail.
    Unconfigured,
    Memory,
    Fs { root: PathBuf },
    S3(S3Config),
}

/// Token verification settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub jwks_url: Option<String>,
    pub hmac_secret: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub roles_claim: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    pub log_filter: String,
    pub tls: Option<TlsPaths>,
    pub store: StoreConfig,
    pub keys: CollectionKeys,
    pub auth: AuthSettings,
    pub gate: GatePolicy,
    pub cookie_name: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| invalid("PORT", &raw, e))?,
            None => DEFAULT_PORT,
        };

        let environment = match get("APP_ENV").as_deref().map(str::to_lowercase).as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("development") | Some("dev") | Some("test") | None => Environment::Development,
            Some(other) => return Err(invalid("APP_ENV", other, "expected production or development")),
        };

        let log_format = match get("LOG_FORMAT").as_deref().map(str::to_lowercase).as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => return Err(invalid("LOG_FORMAT", other, "expected json or pretty")),
        };

        let tls = match (get("TLS_CERT_PATH"), get("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Missing {
                    var: "TLS_KEY_PATH",
                    context: "when TLS_CERT_PATH is set",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Missing {
                    var: "TLS_CERT_PATH",
                    context: "when TLS_KEY_PATH is set",
                })
            }
        };

        let store = match get("BLOB_STORE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("none") => StoreConfig::Unconfigured,
            Some("memory") => StoreConfig::Memory,
            Some("fs") => StoreConfig::Fs {
                root: or("BLOB_FS_ROOT", DEFAULT_FS_ROOT).into(),
            },
            Some("s3") => {
                let required = |var: &'static str| {
                    get(var).ok_or(ConfigError::Missing {
                        var,
                        context: "when BLOB_STORE=s3",
                    })
                };
                StoreConfig::S3(S3Config {
                    endpoint: required("S3_ENDPOINT")?,
                    bucket: required("S3_BUCKET")?,
                    region: or("S3_REGION", DEFAULT_S3_REGION),
                    access_key_id: required("S3_ACCESS_KEY_ID")?,
                    secret_access_key: required("S3_SECRET_ACCESS_KEY")?,
                })
            }
            Some(other) => return Err(invalid("BLOB_STORE", other, "expected s3, fs or memory")),
        };

        let mut keys = CollectionKeys::new();
        for kind in CollectionKind::ALL {
            let var = format!("COLLECTION_KEY_{}", kind.name().to_uppercase());
            if let Some(key) = get(&var) {
                keys = keys.with_key(kind, key);
            }
        }
        if let Some(prefix) = get("BACKUP_PREFIX") {
            keys = keys.with_backup_prefix(prefix);
        }

        let auth = AuthSettings {
            jwks_url: get("AUTH_JWKS_URL"),
            hmac_secret: get("AUTH_HMAC_SECRET"),
            issuer: get("AUTH_ISSUER"),
            audience: get("AUTH_AUDIENCE"),
            roles_claim: or("AUTH_ROLES_CLAIM", DEFAULT_ROLES_CLAIM),
        };
        if (auth.jwks_url.is_some() || auth.hmac_secret.is_some()) && auth.issuer.is_none() {
            return Err(ConfigError::Missing {
                var: "AUTH_ISSUER",
                context: "when a token key source is configured",
            });
        }

        let prefix_raw = or("GATE_PREFIX", DEFAULT_GATE_PREFIX);
        if !prefix_raw.starts_with('/') {
            return Err(invalid("GATE_PREFIX", &prefix_raw, "must start with '/'"));
        }
        let prefix = prefix_raw.trim_end_matches('/').to_string();
        if prefix.is_empty() {
            return Err(invalid("GATE_PREFIX", &prefix_raw, "cannot be the site root"));
        }
        let allowed_raw = or("GATE_ALLOWED_ROLES", DEFAULT_ALLOWED_ROLES);
        let allowed_roles = RoleSet::parse_list(&allowed_raw);
        if allowed_roles.is_empty() {
            return Err(invalid("GATE_ALLOWED_ROLES", &allowed_raw, "names no roles"));
        }
        let rules_raw = lookup("GATE_ROLE_RULES").unwrap_or_else(|| default_role_rules(&prefix));
        let rules = GateRule::parse_list(&rules_raw)
            .map_err(|reason| invalid("GATE_ROLE_RULES", &rules_raw, reason))?;

        let gate = GatePolicy {
            prefix,
            allowed_roles,
            rules,
            sign_in_path: or("SIGN_IN_PATH", DEFAULT_SIGN_IN_PATH),
            pending_path: or("PENDING_PATH", DEFAULT_PENDING_PATH),
            unauthorized_path: or("UNAUTHORIZED_PATH", DEFAULT_UNAUTHORIZED_PATH),
        };

        Ok(Self {
            host: or("HOST", DEFAULT_HOST),
            port,
            environment,
            log_format,
            log_filter: or("RUST_LOG", DEFAULT_LOG_FILTER),
            tls,
            store,
            keys,
            auth,
            gate,
            cookie_name: or("SESSION_COOKIE_NAME", DEFAULT_COOKIE_NAME),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|e| invalid("HOST", &raw, e))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn session_cookie(&self) -> SessionCookie {
        SessionCookie::new(self.cookie_name.clone(), self.is_production())
    }

    /// Construct the configured blob store, `None` when unconfigured.
    pub fn build_store(&self) -> Result<Option<Arc<dyn BlobStore>>, ConfigError> {
        let store: Arc<dyn BlobStore> = match &self.store {
            StoreConfig::Unconfigured => return Ok(None),
            StoreConfig::Memory => Arc::new(MemoryBlobStore::new()),
            StoreConfig::Fs { root } => Arc::new(FsBlobStore::new(root)),
            StoreConfig::S3(s3) => {
                Arc::new(S3BlobStore::new(s3.clone()).map_err(|e| ConfigError::Init {
                    component: "S3 client",
                    reason: e.to_string(),
                })?)
            }
        };
        Ok(Some(store))
    }

    /// Construct the token verifier. Without a key source it rejects everything.
    pub fn build_verifier(&self) -> Result<TokenVerifier, ConfigError> {
        let resolver: Arc<dyn KeyResolver> = match (&self.auth.jwks_url, &self.auth.hmac_secret) {
            (Some(url), _) => Arc::new(JwksManager::new(url.clone()).map_err(|e| {
                ConfigError::Init {
                    component: "JWKS client",
                    reason: e.to_string(),
                }
            })?),
            (None, Some(secret)) => Arc::new(StaticKeyResolver::hmac(secret.as_bytes())),
            (None, None) => return Ok(TokenVerifier::disabled()),
        };
        let issuer = self.auth.issuer.clone().ok_or(ConfigError::Missing {
            var: "AUTH_ISSUER",
            context: "when a token key source is configured",
        })?;

        let mut verifier =
            TokenVerifier::new(resolver, issuer).with_roles_claim(self.auth.roles_claim.clone());
        if let Some(audience) = &self.auth.audience {
            verifier = verifier.with_audience(audience.clone());
        }
        Ok(verifier)
    }
}

fn invalid(var: &str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var: var.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
