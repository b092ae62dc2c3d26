// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account lookup seam.
//!
//! The relational persistence layer owns account records. The gateway only
//! needs `find_account_by_id`, so that is the whole trait. An in-memory
//! implementation backs tests and single-node deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::Account;

/// Errors raised by an account store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("account store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only account lookup used by the account status gate.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find an account by its subject identifier.
    async fn find_account_by_id(&self, id: &str) -> Result<Option<Account>, StoreError>;
}

#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account.
    pub async fn insert(&self, account: Account) {
        self.accounts
            .write()
            .await
            .insert(account.id.clone(), account);
    }

}

#[async_trait]
impl AccountRepository for InMemoryAccountStore {
    async fn find_account_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(id).cloned())
    }
}
