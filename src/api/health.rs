// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

const OK: &str = "ok";

/// Readiness report for the gateway and its signing keys.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// "ok" when requests can be verified, "degraded" otherwise.
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub service: String,
    /// "ok" or "unavailable".
    pub jwks: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Keys are usable if either cache tier holds them or a shared fetch
/// succeeds now. A warm local tier answers without touching hit counters.
async fn check_jwks(state: &AppState) -> bool {
    state.jwks.is_warm() || state.jwks.get_keys().await.is_ok()
}

fn readiness_report(jwks_ok: bool) -> (StatusCode, Json<ReadyResponse>) {
    let (code, status, jwks) = if jwks_ok {
        (StatusCode::OK, OK, OK)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
    };
    let body = ReadyResponse {
        status: status.to_string(),
        checks: HealthChecks {
            service: OK.to_string(),
            jwks: jwks.to_string(),
        },
    };
    (code, Json(body))
}

/// Reports 503 while no signing key set can be obtained.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Signing keys available", body = ReadyResponse),
        (status = 503, description = "Signing keys unavailable", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    readiness_report(check_jwks(&state).await)
}

/// Process liveness. Never touches the identity provider.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: OK.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to verify tokens", body = ReadyResponse),
        (status = 503, description = "Signing keys unavailable", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}
