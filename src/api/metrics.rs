// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::{error::ApiError, state::AppState};

/// Prometheus scrape endpoint.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus text exposition", content_type = "text/plain")
    )
)]
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(CONTENT_TYPE, state.metrics.content_type())], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            ApiError::internal("Internal server error.").into_response()
        }
    }
}
