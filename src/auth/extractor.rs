// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the access context.
//!
//! Handlers behind [`require_access`](super::middleware::require_access) use
//! `Access` to get the caller's verified token and account:
//!
//! ```rust,ignore
//! async fn me(Access(context): Access) -> impl IntoResponse {
//!     // context.account() is the caller's VERIFIED account
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::AuthError;
use super::pipeline::AccessContext;

/// Context stored by the access middleware.
///
/// Fails with an internal error when the route is not behind the
/// middleware; that is a wiring bug, not a caller error.
pub struct Access(pub AccessContext);

impl<S> FromRequestParts<S> for Access
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessContext>()
            .cloned()
            .map(Access)
            .ok_or_else(|| AuthError::Internal("route is not behind the access middleware".to_string()))
    }
}
