// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AccessPipeline, JwksCache};
use crate::jwks_refresher::{JwksRefresher, DEFAULT_REFRESH_INTERVAL};
use crate::metrics::GatewayMetrics;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub jwks: JwksCache,
    /// Same refresh path the background task runs.
    pub refresher: JwksRefresher,
    pub pipeline: Arc<AccessPipeline>,
    pub metrics: GatewayMetrics,
    /// Realm role required on `/v1` account routes.
    pub user_role: String,
    /// Realm role required on `/v1/admin` routes.
    pub admin_role: String,
}

impl AppState {
    pub fn new(pipeline: AccessPipeline, metrics: GatewayMetrics) -> Self {
        let jwks = pipeline.verifier().jwks().clone();
        Self {
            refresher: JwksRefresher::new(jwks.clone(), DEFAULT_REFRESH_INTERVAL),
            jwks,
            pipeline: Arc::new(pipeline),
            metrics,
            user_role: "fapi-user".to_string(),
            admin_role: "gateway-admin".to_string(),
        }
    }

    pub fn with_roles(mut self, user_role: impl Into<String>, admin_role: impl Into<String>) -> Self {
        self.user_role = user_role.into();
        self.admin_role = admin_role.into();
        self
    }

    pub fn with_refresher(mut self, refresher: JwksRefresher) -> Self {
        self.refresher = refresher;
        self
    }
}
