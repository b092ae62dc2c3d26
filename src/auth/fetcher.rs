// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key set retrieval from the identity provider.
//!
//! The fetcher performs exactly one request per call. Retry policy belongs
//! to its callers: the JWKS cache retries on the next miss, the refresher on
//! its next tick.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::error::KeySetError;
use super::keys::{KeySetSnapshot, SigningKey};

/// Default timeout for the key endpoint (10 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of fresh key set snapshots.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    async fn fetch(&self) -> Result<KeySetSnapshot, KeySetError>;
}

/// Raw JWKS document. Individual entries are parsed leniently so that an EC
/// or symmetric key published alongside the RSA keys does not poison the set.
#[derive(Deserialize)]
struct JwksDocument {
    keys: Vec<serde_json::Value>,
}

/// Fetches `<issuer-base>/realms/<realm>/protocol/openid-connect/certs`.
#[derive(Clone)]
pub struct HttpKeySetFetcher {
    certs_url: String,
    client: reqwest::Client,
}

impl HttpKeySetFetcher {
    pub fn new(certs_url: impl Into<String>, timeout: Duration) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeySetError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            certs_url: certs_url.into(),
            client,
        })
    }

    pub fn certs_url(&self) -> &str {
        &self.certs_url
    }
}

/// Parse a JWKS response body into a snapshot.
///
/// The body must be an object with a `keys` array. Entries that are not
/// RSA keys with `n`/`e` are skipped; an array with no usable entries yields
/// an empty (but valid) snapshot.
pub fn parse_key_set(body: &[u8]) -> Result<KeySetSnapshot, KeySetError> {
    let document: JwksDocument =
        serde_json::from_slice(body).map_err(|e| KeySetError::Malformed(e.to_string()))?;

    let total = document.keys.len();
    let keys: Vec<SigningKey> = document
        .keys
        .into_iter()
        .filter_map(|raw| serde_json::from_value::<SigningKey>(raw).ok())
        .filter(|key| key.kty == "RSA")
        .collect();

    if keys.len() < total {
        debug!(
            skipped = total - keys.len(),
            "Ignoring JWKS entries that are not RSA keys"
        );
    }

    Ok(KeySetSnapshot::new(keys))
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch(&self) -> Result<KeySetSnapshot, KeySetError> {
        let response = self
            .client
            .get(&self.certs_url)
            .send()
            .await
            .map_err(|e| KeySetError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeySetError::Unavailable(format!(
                "HTTP {status} from key endpoint"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| KeySetError::Unavailable(e.to_string()))?;

        let snapshot = parse_key_set(&body)?;
        info!(url = %self.certs_url, keys = snapshot.len(), "Fetched signing keys");
        Ok(snapshot)
    }
}
