// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Helpers for router-level tests: a mock identity provider, token minting
//! and a gateway wired the way `main` wires it.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use access_gateway::{
    api::router,
    auth::{
        AccessPipeline, AccountStatusGate, HttpKeySetFetcher, JwksCache, JwksCacheConfig,
        TokenVerifier, VerifierConfig,
    },
    cache::{InMemoryRemoteCache, RemoteCache},
    metrics::GatewayMetrics,
    models::{Account, AccountStatus},
    state::AppState,
    store::InMemoryAccountStore,
};
use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PRIMARY_PEM: &str = include_str!("../fixtures/rsa_primary.pem");
pub const ROTATED_PEM: &str = include_str!("../fixtures/rsa_rotated.pem");

pub const PRIMARY_N: &str = "qZ9jAVvUuo_MZRafcC-P3KdQhz4ohU087kfyDJAFrlzVCN4clfdDftYv9a-pzN1hzhLJV7xZIK_n5vAm8Ga5CvhOLz56e9ZjMMD63bpssSoLVsv50q6sgRi9G7SZWhUTpwrZtlHYYO01U1LlGUjigp36teTuLWrcqxU_tGJZKSrZL3bsoIcpzSOgmb1qIg2xI00ileyoqZ5qcE9lv7L38PRmSZOQCGOV8I-22Mn2d_Kitby9qYDZYZ6VtzvFC2kcQzKvpqNn2x49xN_B87-ZeMpp3aOgLpN5dAmrzNiUod4mcnOZk5lyLIq2x6qR_MVtRkP-qK6xpuj5rbCSbT1LAw";
pub const ROTATED_N: &str = "uI2N6D6XjxqZMM1xwaPv5ezW_A2rsHVNKG5wQt8wswQjpcyYiQ1ruex15lpwfvU6sSNyh73Jkgtcxv9we67ymtZLKMiAxtPLuQGyU4uusxyoyAsw9IuFiDmXoC4h692AiPYk8ROc-2ioK2wFjJ9zEE4LkdyKFfvM3eIek9lzq41YnWFU77WnCja5bKSVeFLTGEP2wPuqhbrL9zFwsnQy05FziViGc-KlvsdnH_iSTf5KpXrWQJPHFi5raz-uvRuR5WVHB6w5e-FYb1CQ4F8qfBQBPKXZ5-MCD3a2xgWr6TONdJVeF34TsP7M_5Q8au_4f30seR72sy7KWN_klOeqFQ";

pub const REALM: &str = "fapi";
pub const CERTS_PATH: &str = "/realms/fapi/protocol/openid-connect/certs";
pub const USER_ROLE: &str = "fapi-user";
pub const ADMIN_ROLE: &str = "gateway-admin";

pub fn jwks_body(keys: &[(&str, &str)]) -> Value {
    let keys: Vec<Value> = keys
        .iter()
        .map(|(kid, n)| json!({"kid": kid, "kty": "RSA", "alg": "RS256", "use": "sig", "n": n, "e": "AQAB"}))
        .collect();
    json!({ "keys": keys })
}

/// Serve `keys` from the certs endpoint, replacing whatever was mounted.
pub async fn serve_keys(server: &MockServer, keys: &[(&str, &str)]) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path(CERTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body(keys)))
        .mount(server)
        .await;
}

pub async fn serve_outage(server: &MockServer) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path(CERTS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;
}

pub fn issuer(server: &MockServer) -> String {
    format!("{}/realms/{REALM}", server.uri())
}

pub fn claims(server: &MockServer, sub: &str, roles: &[&str]) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": sub,
        "iss": issuer(server),
        "aud": "account",
        "exp": now + 300,
        "iat": now,
        "azp": "portal",
        "sid": "session-1",
        "scope": "openid email profile",
        "email": format!("{sub}@example.com"),
        "email_verified": true,
        "preferred_username": sub,
        "realm_access": { "roles": roles }
    })
}

pub fn mint(kid: &str, pem: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap()).unwrap()
}

pub struct Gateway {
    pub app: Router,
    pub jwks: JwksCache,
    pub metrics: GatewayMetrics,
    pub accounts: Arc<InMemoryAccountStore>,
}

/// Gateway against `server`, sharing `remote` with any other gateway built
/// over the same cache.
pub async fn gateway(server: &MockServer, remote: Arc<InMemoryRemoteCache>) -> Gateway {
    let metrics = GatewayMetrics::new().unwrap();
    let fetcher = HttpKeySetFetcher::new(
        format!("{}{CERTS_PATH}", server.uri()),
        Duration::from_secs(2),
    )
    .unwrap();
    let remote: Arc<dyn RemoteCache> = remote;
    let jwks = JwksCache::new(
        Arc::new(fetcher),
        remote,
        JwksCacheConfig::new(format!("gateway:jwks:{REALM}")),
        metrics.clone(),
    );

    let accounts = Arc::new(InMemoryAccountStore::new());
    let pipeline = AccessPipeline::new(
        TokenVerifier::new(jwks.clone(), VerifierConfig::new(issuer(server))),
        AccountStatusGate::new(accounts.clone()),
        metrics.clone(),
    );
    let state = AppState::new(pipeline, metrics.clone()).with_roles(USER_ROLE, ADMIN_ROLE);

    Gateway {
        app: router(state),
        jwks,
        metrics,
        accounts,
    }
}

impl Gateway {
    pub async fn add_account(&self, id: &str, status: AccountStatus) {
        self.accounts
            .insert(Account::new(id, id, format!("{id}@example.com"), status))
            .await;
    }

    /// Send a request and return status and JSON body (`Null` if not JSON).
    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = self
            .app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token).await
    }

    pub async fn text(&self, uri: &str) -> String {
        let response = self
            .app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}
