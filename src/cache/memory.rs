// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-local [`RemoteCache`] implementation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{CacheError, RemoteCache};

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// TTL map standing in for the shared cache.
#[derive(Default)]
pub struct InMemoryRemoteCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryRemoteCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteCache for InMemoryRemoteCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Command("cache lock poisoned".to_string()))?;

        let live = entries
            .get(key)
            .map(|entry| (entry.expires_at > Instant::now(), entry.value.clone()));

        match live {
            Some((true, value)) => Ok(Some(value)),
            Some((false, _)) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Command("cache lock poisoned".to_string()))?;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
