// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Account Models
//!
//! The gateway reads account records owned by the persistence layer; it
//! never writes them. Status transitions happen in the account routes of
//! the wider service, not here.
//!
//! ## Lifecycle
//!
//! | Status | Gate outcome |
//! |--------|--------------|
//! | `UNVERIFIED` | rejected, account not verified |
//! | `VERIFIED` | admitted |
//! | `BANNED` | rejected, account suspended |
//! | `DELETED` | rejected, account suspended |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Account Status
// =============================================================================

/// Lifecycle state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Registered, email confirmation pending.
    Unverified,
    /// Fully active account.
    Verified,
    /// Blocked by an administrator.
    Banned,
    /// Soft-deleted.
    Deleted,
}

impl AccountStatus {
    /// Whether the account may pass the status gate.
    pub fn is_active(self) -> bool {
        self == AccountStatus::Verified
    }

    /// Whether the account is banned or deleted.
    pub fn is_suspended(self) -> bool {
        matches!(self, AccountStatus::Banned | AccountStatus::Deleted)
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Unverified => write!(f, "UNVERIFIED"),
            AccountStatus::Verified => write!(f, "VERIFIED"),
            AccountStatus::Banned => write!(f, "BANNED"),
            AccountStatus::Deleted => write!(f, "DELETED"),
        }
    }
}

/// Who deleted an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeletedBy {
    User,
    System,
    Admin,
}

// =============================================================================
// Account
// =============================================================================

/// Locally stored account record.
///
/// The `id` is the identity provider's subject identifier, so a verified
/// token's `sub` claim is the lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    /// Subject identifier shared with the identity provider.
    pub id: String,
    pub username: String,
    pub email: String,
    pub status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<DeletedBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create an account record stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        status: AccountStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            status,
            deleted_by: None,
            deleted_by_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
