// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Shared Cache Tier
//!
//! A key-value store with TTL semantics shared by every gateway instance.
//! The JWKS cache stores one serialized key set here so a cold instance can
//! skip the identity provider entirely.
//!
//! - [`RedisCache`] - production backend (`CACHE_URL`)
//! - [`InMemoryRemoteCache`] - process-local stand-in for tests and
//!   single-instance deployments

use std::time::Duration;

use async_trait::async_trait;

pub mod memory;
pub mod redis_store;

pub use memory::InMemoryRemoteCache;
pub use redis_store::RedisCache;

/// Errors raised by a shared cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache connection failed: {0}")]
    Connection(String),
    #[error("cache command failed: {0}")]
    Command(String),
}

/// Shared key-value cache with per-entry TTL.
#[async_trait]
pub trait RemoteCache: Send + Sync {
    /// Read a value; `Ok(None)` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}
