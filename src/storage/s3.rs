// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! S3-compatible object store client.
//!
//! Talks to any S3-compatible endpoint (AWS, R2, MinIO) with path-style
//! addressing and AWS Signature Version 4. Only whole-object GET and PUT are
//! needed, so the client signs exactly three headers: `host`,
//! `x-amz-content-sha256` and `x-amz-date`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};

use super::blob::{BlobError, BlobResult, BlobStore};

/// Request timeout for every object store call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

type HmacSha256 = Hmac<Sha256>;

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    /// Base endpoint, e.g. `https://s3.us-east-1.amazonaws.com`
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Headers produced by signing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub url: String,
    pub host: String,
    pub amz_date: String,
    pub payload_hash: String,
    pub authorization: String,
}

/// Blob store backed by an S3-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    config: S3Config,
    http: Client,
}

impl S3BlobStore {
    pub fn new(config: S3Config) -> BlobResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BlobError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Sign a request for `key` at time `now`.
    pub fn sign(
        &self,
        method: &str,
        key: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> BlobResult<SignedRequest> {
        let endpoint = url::Url::parse(&self.config.endpoint)
            .map_err(|e| BlobError::Transport(format!("invalid endpoint: {e}")))?;
        let host_name = endpoint
            .host_str()
            .ok_or_else(|| BlobError::Transport("endpoint has no host".to_string()))?;
        let host = match endpoint.port() {
            Some(port) => format!("{host_name}:{port}"),
            None => host_name.to_string(),
        };

        let base_path = endpoint.path().trim_end_matches('/');
        let canonical_uri = format!(
            "{base_path}/{}/{}",
            uri_encode(&self.config.bucket, false),
            uri_encode(key.trim_start_matches('/'), true)
        );

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();
        let payload_hash = hex::encode(Sha256::digest(payload));

        let canonical_request = format!(
            "{method}\n{canonical_uri}\n\nhost:{host}\nx-amz-content-sha256:{payload_hash}\nx-amz-date:{amz_date}\n\n{SIGNED_HEADERS}\n{payload_hash}"
        );

        let scope = format!("{date_stamp}/{}/s3/aws4_request", self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = signing_key(
            &self.config.secret_access_key,
            &date_stamp,
            &self.config.region,
            "s3",
        );
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.config.access_key_id
        );

        let url = format!("{}://{host}{canonical_uri}", endpoint.scheme());

        Ok(SignedRequest {
            url,
            host,
            amz_date,
            payload_hash,
            authorization,
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn get(&self, key: &str) -> BlobResult<Vec<u8>> {
        let signed = self.sign("GET", key, b"", Utc::now())?;

        let response = self
            .http
            .get(&signed.url)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.payload_hash)
            .header("authorization", &signed.authorization)
            .send()
            .await
            .map_err(|e| BlobError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(BlobError::NotFound(key.to_string())),
            status if status.is_success() => response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| BlobError::Transport(e.to_string())),
            status => Err(BlobError::Status {
                key: key.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> BlobResult<()> {
        let signed = self.sign("PUT", key, &bytes, Utc::now())?;

        let response = self
            .http
            .put(&signed.url)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.payload_hash)
            .header("authorization", &signed.authorization)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| BlobError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlobError::Status {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "s3"
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Derive the SigV4 signing key for one day, region and service.
pub fn signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Percent-encode per the SigV4 rules: unreserved characters pass through,
/// `/` passes through only when `keep_slash` is set.
fn uri_encode(input: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
