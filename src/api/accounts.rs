// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caller identity endpoint.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{auth::Access, models::Account};

/// The caller as seen by the gateway.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// Token subject, equal to the account id.
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub email_verified: bool,
    pub realm_roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub account: Account,
}

/// Get the authenticated caller.
///
/// Requires a verified email, the configured user realm role and a
/// `VERIFIED` account.
#[utoipa::path(
    get,
    path = "/v1/accounts/me",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller identity and account", body = MeResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
        (status = 403, description = "Missing role or account not active", body = crate::error::ErrorBody),
        (status = 404, description = "No account for this subject", body = crate::error::ErrorBody)
    )
)]
pub async fn me(Access(context): Access) -> Json<MeResponse> {
    let (token, account) = context.into_parts();
    let claims = token.into_claims();

    Json(MeResponse {
        subject: claims.sub,
        preferred_username: claims.preferred_username,
        email: claims.email,
        email_verified: claims.email_verified,
        realm_roles: claims.realm_access.roles,
        session_id: claims.sid,
        account,
    })
}
