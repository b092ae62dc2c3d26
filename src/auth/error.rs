// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access verification errors.
//!
//! Every variant is distinct in logs and metrics (see [`AuthError::error_code`]),
//! but callers only ever learn the [`FailureCategory`] and the
//! [`AuthError::public_message`]. All token failures share one message so a
//! forged token cannot be refined against the gateway.

use crate::models::AccountStatus;

/// Outcome category handed to the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    Unauthenticated,
    Forbidden,
    NotFound,
    Internal,
}

/// Failure to obtain a usable key set from the identity provider.
///
/// `Clone` because one in-flight fetch hands its result to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeySetError {
    /// Network error, timeout or non-success status.
    #[error("key set unavailable: {0}")]
    Unavailable(String),
    /// Response body is not a `{"keys": [...]}` document.
    #[error("key set malformed: {0}")]
    Malformed(String),
}

impl KeySetError {
    /// Metrics label for this failure.
    pub fn outcome(&self) -> &'static str {
        match self {
            KeySetError::Unavailable(_) => "unavailable",
            KeySetError::Malformed(_) => "malformed",
        }
    }
}

/// Access pipeline rejection.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no bearer credentials in the authorization header")]
    MissingCredentials,
    #[error("token cannot be decoded or has no key id")]
    MalformedToken,
    #[error("no signing key with kid `{kid}` in the current key set")]
    UnknownSigningKey { kid: String },
    #[error("token signature or algorithm is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    TokenExpired,
    #[error("token is not yet valid")]
    TokenNotYetValid,
    #[error("token issuer is not trusted")]
    InvalidIssuer,
    #[error("token audience does not match")]
    InvalidAudience,
    #[error("email address is not verified")]
    EmailNotVerified,
    #[error("missing required realm role `{role}`")]
    InsufficientPrivileges { role: String },
    #[error("no account for subject `{subject}`")]
    AccountNotFound { subject: String },
    #[error("account is not verified")]
    AccountNotVerified,
    #[error("account is {status}")]
    AccountSuspended { status: AccountStatus },
    #[error("signing keys unavailable: {0}")]
    KeySetUnavailable(String),
    #[error("signing keys malformed: {0}")]
    KeySetMalformed(String),
    #[error("internal access error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable code for logs and metric labels. Never sent to the caller.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnknownSigningKey { .. } => "unknown_signing_key",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::EmailNotVerified => "email_not_verified",
            AuthError::InsufficientPrivileges { .. } => "insufficient_privileges",
            AuthError::AccountNotFound { .. } => "account_not_found",
            AuthError::AccountNotVerified => "account_not_verified",
            AuthError::AccountSuspended { .. } => "account_suspended",
            AuthError::KeySetUnavailable(_) => "key_set_unavailable",
            AuthError::KeySetMalformed(_) => "key_set_malformed",
            AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            AuthError::MissingCredentials
            | AuthError::MalformedToken
            | AuthError::UnknownSigningKey { .. }
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::TokenNotYetValid
            | AuthError::InvalidIssuer
            | AuthError::InvalidAudience => FailureCategory::Unauthenticated,
            AuthError::EmailNotVerified
            | AuthError::InsufficientPrivileges { .. }
            | AuthError::AccountNotVerified
            | AuthError::AccountSuspended { .. } => FailureCategory::Forbidden,
            AuthError::AccountNotFound { .. } => FailureCategory::NotFound,
            AuthError::KeySetUnavailable(_)
            | AuthError::KeySetMalformed(_)
            | AuthError::Internal(_) => FailureCategory::Internal,
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::EmailNotVerified => "Email not verified.",
            AuthError::InsufficientPrivileges { .. } => "Insufficient privileges.",
            AuthError::AccountNotFound { .. } => "Account not found.",
            AuthError::AccountNotVerified => "Account is not verified.",
            AuthError::AccountSuspended { .. } => {
                "Your account is banned or disabled. Please contact the administration."
            }
            _ => match self.category() {
                FailureCategory::Unauthenticated => "Invalid credentials.",
                _ => "Internal server error.",
            },
        }
    }
}

impl From<KeySetError> for AuthError {
    fn from(err: KeySetError) -> Self {
        match err {
            KeySetError::Unavailable(msg) => AuthError::KeySetUnavailable(msg),
            KeySetError::Malformed(msg) => AuthError::KeySetMalformed(msg),
        }
    }
}
