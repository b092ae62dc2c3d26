// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Realm role enforcement.

use super::claims::VerifiedToken;
use super::error::AuthError;

/// Check that `token` may act with every role in `required_roles`.
///
/// An unverified email fails before any role is looked at. Otherwise the
/// first required role missing from the realm roles fails the check; the
/// order of `required_roles` only decides which role is reported.
pub fn check_permissions<S: AsRef<str>>(
    token: &VerifiedToken,
    required_roles: &[S],
) -> Result<(), AuthError> {
    if !token.email_verified() {
        return Err(AuthError::EmailNotVerified);
    }

    if let Some(missing) = required_roles
        .iter()
        .map(AsRef::as_ref)
        .find(|role| !token.has_realm_role(role))
    {
        return Err(AuthError::InsufficientPrivileges {
            role: missing.to_string(),
        });
    }

    Ok(())
}
