// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Verification
//!
//! Bearer tokens issued by the identity provider are verified against the
//! realm's published signing keys, then checked for realm roles and finally
//! matched against the caller's local account record.
//!
//! ## Flow
//!
//! 1. Client sends `Authorization: Bearer <access token>`
//! 2. Gateway:
//!    - Reads the token header `kid`
//!    - Resolves the key from the JWKS cache (local, shared, then provider)
//!    - Verifies signature, expiry, not-before, issuer and audience
//!    - Requires a verified email and every configured realm role
//!    - Requires a `VERIFIED` account for the token subject
//! 3. The resulting [`AccessContext`] is attached to the request
//!
//! ## Security
//!
//! - All token failures look the same to the caller
//! - Account state is only consulted after the token and roles pass
//! - Only RSA signature keys are trusted, only RS*/PS* algorithms accepted
//! - Clock skew tolerance is 60 seconds by default

pub mod account;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod jwks;
pub mod keys;
pub mod middleware;
pub mod permissions;
pub mod pipeline;
pub mod verifier;

pub use account::AccountStatusGate;
pub use claims::{TokenClaims, VerifiedToken};
pub use error::{AuthError, FailureCategory, KeySetError};
pub use extractor::Access;
pub use fetcher::{HttpKeySetFetcher, KeySetFetcher};
pub use jwks::{JwksCache, JwksCacheConfig};
pub use keys::{KeySetSnapshot, SigningKey};
pub use middleware::{require_access, AccessPolicy};
pub use permissions::check_permissions;
pub use pipeline::{AccessContext, AccessPipeline};
pub use verifier::{TokenVerifier, VerifierConfig};
