// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access middleware for Axum.
//!
//! Runs the [`AccessPipeline`] in front of a route group and stores the
//! resulting [`AccessContext`] in the request extensions, where the
//! [`Access`](super::extractor::Access) extractor picks it up.
//!
//! ```rust,ignore
//! let policy = AccessPolicy::new(pipeline, ["fapi-user"]);
//! let routes = Router::new()
//!     .route("/accounts/me", get(me))
//!     .route_layer(axum::middleware::from_fn_with_state(policy, require_access));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::pipeline::AccessPipeline;

/// Pipeline plus the realm roles a route group requires.
#[derive(Clone)]
pub struct AccessPolicy {
    pipeline: Arc<AccessPipeline>,
    required_roles: Arc<[String]>,
}

impl AccessPolicy {
    pub fn new<I, S>(pipeline: Arc<AccessPipeline>, required_roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pipeline,
            required_roles: required_roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }
}

/// Reject the request unless the access pipeline admits it.
pub async fn require_access(
    State(policy): State<AccessPolicy>,
    mut request: Request,
    next: Next,
) -> Response {
    // A header that is not valid ASCII is treated as absent.
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let outcome = policy
        .pipeline
        .run(authorization, policy.required_roles())
        .await;

    match outcome {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
