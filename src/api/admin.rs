// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only operational endpoints.
//!
//! These endpoints require the configured admin realm role.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{auth::Access, error::ApiError, state::AppState};

/// Result of a manual key refresh.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub refreshed: bool,
    /// Number of keys in the new key set.
    pub key_count: usize,
}

/// Refresh the signing keys now.
///
/// Fetches the realm's key set from the identity provider and republishes
/// it to both cache tiers. On failure the previous key set stays in use.
#[utoipa::path(
    post,
    path = "/v1/admin/jwks/refresh",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Key set refreshed", body = RefreshResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
        (status = 403, description = "Not authorized (admin required)", body = crate::error::ErrorBody),
        (status = 503, description = "Identity provider unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn refresh_jwks(
    Access(context): Access,
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, ApiError> {
    info!(subject = context.subject(), "Manual JWKS refresh requested");

    let key_count = state
        .refresher
        .refresh_now()
        .await
        .ok_or_else(|| ApiError::service_unavailable("Signing keys could not be refreshed."))?;

    Ok(Json(RefreshResponse {
        refreshed: true,
        key_count,
    }))
}
