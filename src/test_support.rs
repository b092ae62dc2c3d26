// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests: RSA test keys, token minting and a
//! scripted key set fetcher.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use crate::auth::claims::{TokenClaims, VerifiedToken};
use crate::auth::{
    AccessPipeline, AccountStatusGate, JwksCache, JwksCacheConfig, KeySetError, KeySetFetcher,
    KeySetSnapshot, SigningKey, TokenVerifier, VerifierConfig,
};
use crate::cache::InMemoryRemoteCache;
use crate::metrics::GatewayMetrics;
use crate::models::{Account, AccountStatus};
use crate::state::AppState;
use crate::store::InMemoryAccountStore;

pub const PRIMARY_PEM: &str = include_str!("../tests/fixtures/rsa_primary.pem");
pub const ROTATED_PEM: &str = include_str!("../tests/fixtures/rsa_rotated.pem");

/// Modulus of `rsa_primary.pem`.
pub const PRIMARY_N: &str = "qZ9jAVvUuo_MZRafcC-P3KdQhz4ohU087kfyDJAFrlzVCN4clfdDftYv9a-pzN1hzhLJV7xZIK_n5vAm8Ga5CvhOLz56e9ZjMMD63bpssSoLVsv50q6sgRi9G7SZWhUTpwrZtlHYYO01U1LlGUjigp36teTuLWrcqxU_tGJZKSrZL3bsoIcpzSOgmb1qIg2xI00ileyoqZ5qcE9lv7L38PRmSZOQCGOV8I-22Mn2d_Kitby9qYDZYZ6VtzvFC2kcQzKvpqNn2x49xN_B87-ZeMpp3aOgLpN5dAmrzNiUod4mcnOZk5lyLIq2x6qR_MVtRkP-qK6xpuj5rbCSbT1LAw";

/// Modulus of `rsa_rotated.pem`.
pub const ROTATED_N: &str = "uI2N6D6XjxqZMM1xwaPv5ezW_A2rsHVNKG5wQt8wswQjpcyYiQ1ruex15lpwfvU6sSNyh73Jkgtcxv9we67ymtZLKMiAxtPLuQGyU4uusxyoyAsw9IuFiDmXoC4h692AiPYk8ROc-2ioK2wFjJ9zEE4LkdyKFfvM3eIek9lzq41YnWFU77WnCja5bKSVeFLTGEP2wPuqhbrL9zFwsnQy05FziViGc-KlvsdnH_iSTf5KpXrWQJPHFi5raz-uvRuR5WVHB6w5e-FYb1CQ4F8qfBQBPKXZ5-MCD3a2xgWr6TONdJVeF34TsP7M_5Q8au_4f30seR72sy7KWN_klOeqFQ";

pub const TEST_ISSUER: &str = "https://id.example.com/realms/fapi";
pub const TEST_CACHE_KEY: &str = "test:jwks:fapi";

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn signing_key(kid: &str, n: &str) -> SigningKey {
    SigningKey {
        kid: kid.to_string(),
        kty: "RSA".to_string(),
        alg: Some("RS256".to_string()),
        key_use: Some("sig".to_string()),
        n: n.to_string(),
        e: "AQAB".to_string(),
    }
}

/// JWKS document as served by the provider.
pub fn jwks_document(keys: &[(&str, &str)]) -> Value {
    let keys: Vec<Value> = keys
        .iter()
        .map(|(kid, n)| {
            json!({
                "kid": kid,
                "kty": "RSA",
                "alg": "RS256",
                "use": "sig",
                "n": n,
                "e": "AQAB",
                "x5t": "ignored"
            })
        })
        .collect();
    json!({ "keys": keys })
}

/// Claims of a valid token for `sub` with the `fapi-user` role.
pub fn default_claims(sub: &str) -> Value {
    let now = now();
    json!({
        "sub": sub,
        "iss": TEST_ISSUER,
        "aud": "account",
        "exp": now + 300,
        "iat": now,
        "jti": format!("jti-{sub}"),
        "typ": "Bearer",
        "azp": "portal",
        "sid": "session-1",
        "scope": "openid email profile",
        "email": format!("{sub}@example.com"),
        "email_verified": true,
        "preferred_username": sub,
        "realm_access": { "roles": ["fapi-user", "offline_access"] }
    })
}

/// RS256 token signed with `pem`, carrying `kid` in its header.
pub fn mint(kid: &str, pem: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("test key should parse");
    encode(&header, claims, &key).expect("test token should encode")
}

pub fn verified_token(sub: &str, email_verified: bool, roles: &[&str]) -> VerifiedToken {
    let mut claims = default_claims(sub);
    claims["email_verified"] = email_verified.into();
    claims["realm_access"]["roles"] = json!(roles);
    let claims: TokenClaims = serde_json::from_value(claims).expect("claims should parse");
    VerifiedToken::from_verified_claims(claims)
}

/// Fetcher returning a scripted outcome and counting calls.
pub struct ScriptedFetcher {
    outcome: Mutex<Result<KeySetSnapshot, KeySetError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(snapshot: KeySetSnapshot) -> Self {
        Self {
            outcome: Mutex::new(Ok(snapshot)),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: KeySetError) -> Self {
        let fetcher = Self::new(KeySetSnapshot::default());
        fetcher.fail_with(err);
        fetcher
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_keys(&self, snapshot: KeySetSnapshot) {
        *self.outcome.lock().unwrap() = Ok(snapshot);
    }

    pub fn fail_with(&self, err: KeySetError) {
        *self.outcome.lock().unwrap() = Err(err);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetFetcher for ScriptedFetcher {
    async fn fetch(&self) -> Result<KeySetSnapshot, KeySetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.lock().unwrap().clone()
    }
}

pub fn jwks_cache(
    fetcher: Arc<ScriptedFetcher>,
    remote: Arc<InMemoryRemoteCache>,
) -> (JwksCache, GatewayMetrics) {
    let metrics = GatewayMetrics::new().unwrap();
    let cache = JwksCache::new(
        fetcher,
        remote,
        JwksCacheConfig::new(TEST_CACHE_KEY),
        metrics.clone(),
    );
    (cache, metrics)
}

async fn pipeline_with(
    fetcher: Arc<ScriptedFetcher>,
    remote: Arc<InMemoryRemoteCache>,
    status: AccountStatus,
) -> (AccessPipeline, GatewayMetrics) {
    let (cache, metrics) = jwks_cache(fetcher, remote);
    let store = InMemoryAccountStore::new();
    store
        .insert(Account::new("user-1", "jdoe", "user-1@example.com", status))
        .await;

    let pipeline = AccessPipeline::new(
        TokenVerifier::new(cache, VerifierConfig::new(TEST_ISSUER)),
        AccountStatusGate::new(Arc::new(store)),
        metrics.clone(),
    );
    (pipeline, metrics)
}

/// Pipeline trusting the primary key, with account `user-1` in `status`.
pub async fn pipeline_for(status: AccountStatus) -> (AccessPipeline, GatewayMetrics) {
    let fetcher = Arc::new(ScriptedFetcher::new(KeySetSnapshot::new(vec![signing_key(
        "primary", PRIMARY_N,
    )])));
    pipeline_with(fetcher, Arc::new(InMemoryRemoteCache::new()), status).await
}

/// Handler state over `fetcher`, with a `VERIFIED` account `user-1`.
pub async fn app_state(fetcher: Arc<ScriptedFetcher>) -> AppState {
    app_state_with_remote(fetcher, Arc::new(InMemoryRemoteCache::new())).await
}

/// Like [`app_state`], over a caller-provided shared tier.
pub async fn app_state_with_remote(
    fetcher: Arc<ScriptedFetcher>,
    remote: Arc<InMemoryRemoteCache>,
) -> AppState {
    let (pipeline, metrics) = pipeline_with(fetcher, remote, AccountStatus::Verified).await;
    AppState::new(pipeline, metrics)
}
