// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_access, AccessPolicy},
    error::ErrorBody,
    models::{Account, AccountStatus, DeletedBy},
    state::AppState,
};

pub mod accounts;
pub mod admin;
pub mod health;
pub mod metrics;

pub fn router(state: AppState) -> Router {
    let user_policy = AccessPolicy::new(state.pipeline.clone(), [state.user_role.clone()]);
    let admin_policy = AccessPolicy::new(state.pipeline.clone(), [state.admin_role.clone()]);

    let account_routes = Router::new()
        .route("/accounts/me", get(accounts::me))
        .route_layer(from_fn_with_state(user_policy, require_access));

    let admin_routes = Router::new()
        .route("/admin/jwks/refresh", post(admin::refresh_jwks))
        .route_layer(from_fn_with_state(admin_policy, require_access));

    let v1_routes = account_routes.merge(admin_routes).with_state(state.clone());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(metrics::metrics))
        .with_state(state)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        metrics::metrics,
        accounts::me,
        admin::refresh_jwks
    ),
    components(
        schemas(
            Account,
            AccountStatus,
            DeletedBy,
            ErrorBody,
            accounts::MeResponse,
            admin::RefreshResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness, readiness and metrics"),
        (name = "Accounts", description = "Authenticated caller"),
        (name = "Admin", description = "Operational tooling")
    )
)]
struct ApiDoc;
