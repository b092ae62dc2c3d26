// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification against the cached key set.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};

use super::claims::{TokenClaims, VerifiedToken};
use super::error::AuthError;
use super::jwks::JwksCache;
use super::keys::SUPPORTED_ALGORITHMS;

/// Clock skew tolerance (60 seconds).
pub const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Extract the token from an `Authorization` header value.
///
/// Only the `Bearer <token>` form is accepted.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingCredentials)?;

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(token)
}

/// Expected issuer, optional audience and clock leeway.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub issuer: String,
    pub audience: Option<String>,
    pub leeway: u64,
}

impl VerifierConfig {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: None,
            leeway: CLOCK_SKEW_LEEWAY,
        }
    }

    pub fn with_audience(mut self, audience: Option<String>) -> Self {
        self.audience = audience;
        self
    }

    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }
}

/// Turns a raw `Authorization` header into a [`VerifiedToken`].
#[derive(Clone)]
pub struct TokenVerifier {
    jwks: JwksCache,
    config: VerifierConfig,
}

impl TokenVerifier {
    pub fn new(jwks: JwksCache, config: VerifierConfig) -> Self {
        Self { jwks, config }
    }

    pub fn jwks(&self) -> &JwksCache {
        &self.jwks
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify the bearer token carried by `authorization`.
    ///
    /// Every token failure is a distinct [`AuthError`] variant, but all of
    /// them share the `Unauthenticated` category. A key set that cannot be
    /// loaded at all is an internal failure.
    pub async fn verify(&self, authorization: Option<&str>) -> Result<VerifiedToken, AuthError> {
        let token = bearer_token(authorization)?;

        // Header first; nothing from the payload is trusted yet.
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or(AuthError::MalformedToken)?;

        if !SUPPORTED_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::InvalidSignature);
        }

        // One snapshot for the whole call.
        let snapshot = self.jwks.get_keys().await?;
        let key = snapshot
            .find(&kid)
            .ok_or_else(|| AuthError::UnknownSigningKey { kid: kid.clone() })?;

        if !key.permits(header.alg) {
            return Err(AuthError::InvalidSignature);
        }

        let decoding_key = key
            .decoding_key()
            .map_err(|e| AuthError::KeySetMalformed(format!("key `{kid}`: {e}")))?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.config.leeway;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[&self.config.issuer]);

        match self.config.audience {
            Some(ref audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let token_data =
            decode::<TokenClaims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                _ => AuthError::MalformedToken,
            })?;

        Ok(VerifiedToken::from_verified_claims(token_data.claims))
    }
}
