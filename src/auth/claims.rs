// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the verified-token representation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `aud` claim: a single audience or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// `realm_access` claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims carried by an access token from the identity provider.
///
/// Only `sub`, `iss` and `exp` are required; the rest depends on the
/// client's scopes and mappers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TokenClaims {
    /// Subject: the account id
    pub sub: String,
    /// Issuer
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Not before timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Authorized party (client id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    /// Session ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Missing means not verified.
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default)]
    pub realm_access: RealmAccess,
    /// Client roles, keyed by client id
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub resource_access: HashMap<String, RealmAccess>,
}

/// Claims of a token whose signature and standard claims have been checked.
///
/// Only the token verifier constructs this type.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    claims: TokenClaims,
}

impl VerifiedToken {
    pub(crate) fn from_verified_claims(claims: TokenClaims) -> Self {
        Self { claims }
    }

    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn email_verified(&self) -> bool {
        self.claims.email_verified
    }

    pub fn realm_roles(&self) -> &[String] {
        &self.claims.realm_access.roles
    }

    pub fn has_realm_role(&self, role: &str) -> bool {
        self.realm_roles().iter().any(|r| r == role)
    }

    /// Scope claim split on whitespace.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.claims.scope.as_deref().unwrap_or_default().split_whitespace()
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    pub fn into_claims(self) -> TokenClaims {
        self.claims
    }
}
