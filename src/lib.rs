// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access Gateway - identity-aware API gateway layer
//!
//! Verifies bearer tokens issued by the OpenID Connect provider against a
//! two-tier cached key set, enforces realm roles and admits only callers
//! whose local account is `VERIFIED`.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Access verification pipeline (JWKS, token, roles, account)
//! - `cache` - Shared cache tier (Redis or in-process)
//! - `jwks_refresher` - Background signing key refresh
//! - `store` - Account lookup

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod jwks_refresher;
pub mod metrics;
pub mod models;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_support;
