// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing keys and key set snapshots.
//!
//! A [`KeySetSnapshot`] is fetched as a whole, shared behind an `Arc` and
//! replaced wholesale on the next fetch. Nothing mutates a snapshot once it
//! has been published.

use std::str::FromStr;

use jsonwebtoken::{Algorithm, DecodingKey};
use serde::{Deserialize, Serialize};

/// Token algorithms accepted for RSA signing keys.
pub const SUPPORTED_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// One RSA key from the provider's JWKS document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    /// Key ID
    pub kid: String,
    /// Key type
    pub kty: String,
    /// Declared algorithm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Key use (`sig` or `enc`)
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// RSA modulus, base64url
    pub n: String,
    /// RSA exponent, base64url
    pub e: String,
}

impl SigningKey {
    /// Whether this key may verify token signatures.
    pub fn is_signature_key(&self) -> bool {
        self.kty == "RSA" && self.key_use.as_deref().is_none_or(|u| u == "sig")
    }

    /// Whether a token declaring `alg` may be verified with this key.
    ///
    /// Keys without a declared `alg` accept any supported RSA algorithm.
    pub fn permits(&self, alg: Algorithm) -> bool {
        if !SUPPORTED_ALGORITHMS.contains(&alg) {
            return false;
        }
        match self.alg.as_deref() {
            Some(declared) => Algorithm::from_str(declared).is_ok_and(|d| d == alg),
            None => true,
        }
    }

    /// Convert into verification key material.
    pub fn decoding_key(&self) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
        DecodingKey::from_rsa_components(&self.n, &self.e)
    }
}

/// Immutable key set as returned by one successful fetch.
///
/// Serialized as the bare key array for the shared cache tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySetSnapshot {
    keys: Vec<SigningKey>,
}

impl KeySetSnapshot {
    pub fn new(keys: Vec<SigningKey>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[SigningKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Signature key with exactly this `kid`.
    pub fn find(&self, kid: &str) -> Option<&SigningKey> {
        self.keys
            .iter()
            .find(|key| key.kid == kid && key.is_signature_key())
    }
}
