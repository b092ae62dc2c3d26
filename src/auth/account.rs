// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account lifecycle gate.

use std::sync::Arc;

use super::error::AuthError;
use crate::models::{Account, AccountStatus};
use crate::store::AccountRepository;

/// Admits only subjects whose account exists and is `VERIFIED`.
///
/// Reads the repository once per call and never writes to it.
#[derive(Clone)]
pub struct AccountStatusGate {
    accounts: Arc<dyn AccountRepository>,
}

impl AccountStatusGate {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn check_account_status(&self, subject: &str) -> Result<Account, AuthError> {
        let account = self
            .accounts
            .find_account_by_id(subject)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or_else(|| AuthError::AccountNotFound {
                subject: subject.to_string(),
            })?;

        match account.status {
            AccountStatus::Verified => Ok(account),
            AccountStatus::Unverified => Err(AuthError::AccountNotVerified),
            status @ (AccountStatus::Banned | AccountStatus::Deleted) => {
                Err(AuthError::AccountSuspended { status })
            }
        }
    }
}
