// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The access verification pipeline.
//!
//! ```text
//! Authorization header
//!   -> authenticate  (TokenVerifier)        -> VerifiedToken
//!   -> authorize     (check_permissions)    -> VerifiedToken
//!   -> admit         (AccountStatusGate)    -> AccessContext
//! ```
//!
//! Stages run strictly in order and the first failure ends the run. Each
//! stage takes the value produced by the previous one, so a later stage
//! cannot run on input an earlier stage did not accept.

use tracing::{debug, error, info, warn};

use super::account::AccountStatusGate;
use super::claims::VerifiedToken;
use super::error::{AuthError, FailureCategory};
use super::permissions::check_permissions;
use super::verifier::TokenVerifier;
use crate::metrics::GatewayMetrics;
use crate::models::Account;

/// Request-scoped result of a successful run: the verified token and the
/// caller's account record.
#[derive(Debug, Clone)]
pub struct AccessContext {
    token: VerifiedToken,
    account: Account,
}

impl AccessContext {
    pub(crate) fn new(token: VerifiedToken, account: Account) -> Self {
        Self { token, account }
    }

    pub fn subject(&self) -> &str {
        self.token.subject()
    }

    pub fn token(&self) -> &VerifiedToken {
        &self.token
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn into_parts(self) -> (VerifiedToken, Account) {
        (self.token, self.account)
    }
}

pub struct AccessPipeline {
    verifier: TokenVerifier,
    gate: AccountStatusGate,
    metrics: GatewayMetrics,
}

impl AccessPipeline {
    pub fn new(verifier: TokenVerifier, gate: AccountStatusGate, metrics: GatewayMetrics) -> Self {
        Self {
            verifier,
            gate,
            metrics,
        }
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Run all three stages for one request.
    ///
    /// A rejection is logged and counted here, once, under its
    /// [`AuthError::error_code`].
    pub async fn run<S: AsRef<str>>(
        &self,
        authorization: Option<&str>,
        required_roles: &[S],
    ) -> Result<AccessContext, AuthError> {
        let result = self.run_stages(authorization, required_roles).await;

        match &result {
            Ok(context) => {
                debug!(subject = context.subject(), "Access granted");
                self.metrics.record_success();
            }
            Err(err) => self.record_rejection(err),
        }
        result
    }

    async fn run_stages<S: AsRef<str>>(
        &self,
        authorization: Option<&str>,
        required_roles: &[S],
    ) -> Result<AccessContext, AuthError> {
        let token = self.authenticate(authorization).await?;
        let token = self.authorize(token, required_roles)?;
        self.admit(token).await
    }

    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<VerifiedToken, AuthError> {
        self.verifier.verify(authorization).await
    }

    pub fn authorize<S: AsRef<str>>(
        &self,
        token: VerifiedToken,
        required_roles: &[S],
    ) -> Result<VerifiedToken, AuthError> {
        check_permissions(&token, required_roles)?;
        Ok(token)
    }

    pub async fn admit(&self, token: VerifiedToken) -> Result<AccessContext, AuthError> {
        let account = self.gate.check_account_status(token.subject()).await?;
        Ok(AccessContext::new(token, account))
    }

    fn record_rejection(&self, err: &AuthError) {
        let error_code = err.error_code();

        match (err, err.category()) {
            (AuthError::UnknownSigningKey { kid }, _) => {
                warn!(error_code, kid = %kid, "Token signed by a key not in the current key set");
            }
            (_, FailureCategory::Internal) => {
                error!(error_code, error = %err, "Access verification failed");
            }
            _ => {
                info!(error_code, error = %err, "Access denied");
            }
        }

        self.metrics.record_rejection(error_code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::keys::KeySetSnapshot;
    use crate::auth::verifier::VerifierConfig;
    use crate::cache::InMemoryRemoteCache;
    use crate::models::AccountStatus;
    use crate::store::{AccountRepository, InMemoryAccountStore, StoreError};
    use crate::test_support::{
        default_claims, jwks_cache, mint, signing_key, ScriptedFetcher, PRIMARY_N, PRIMARY_PEM,
        TEST_ISSUER,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const USER_ROLE: [&str; 1] = ["fapi-user"];

    /// Repository that counts lookups.
    struct CountingRepository {
        inner: InMemoryAccountStore,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl AccountRepository for CountingRepository {
        async fn find_account_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_account_by_id(id).await
        }
    }

    struct Harness {
        pipeline: AccessPipeline,
        accounts: Arc<CountingRepository>,
        metrics: GatewayMetrics,
    }

    async fn harness(status: AccountStatus) -> Harness {
        let fetcher = Arc::new(ScriptedFetcher::new(KeySetSnapshot::new(vec![signing_key(
            "primary", PRIMARY_N,
        )])));
        let (cache, metrics) = jwks_cache(fetcher, Arc::new(InMemoryRemoteCache::new()));

        let accounts = Arc::new(CountingRepository {
            inner: InMemoryAccountStore::new(),
            lookups: AtomicUsize::new(0),
        });
        accounts
            .inner
            .insert(Account::new("user-1", "jdoe", "jdoe@example.com", status))
            .await;

        let pipeline = AccessPipeline::new(
            TokenVerifier::new(cache, VerifierConfig::new(TEST_ISSUER)),
            AccountStatusGate::new(accounts.clone()),
            metrics.clone(),
        );
        Harness {
            pipeline,
            accounts,
            metrics,
        }
    }

    fn header_for(claims: &serde_json::Value) -> String {
        format!("Bearer {}", mint("primary", PRIMARY_PEM, claims))
    }

    #[tokio::test]
    async fn valid_request_exposes_subject_and_account() {
        let h = harness(AccountStatus::Verified).await;
        let header = header_for(&default_claims("user-1"));

        let context = h.pipeline.run(Some(&header), &USER_ROLE).await.unwrap();

        assert_eq!(context.subject(), "user-1");
        assert_eq!(context.account().id, "user-1");
        assert_eq!(context.account().status, AccountStatus::Verified);
        assert_eq!(h.metrics.success_count(), 1);
    }

    #[tokio::test]
    async fn deleted_account_is_suspended_after_earlier_stages_pass() {
        let h = harness(AccountStatus::Deleted).await;
        let header = header_for(&default_claims("user-1"));

        let err = h.pipeline.run(Some(&header), &USER_ROLE).await.unwrap_err();

        assert!(matches!(
            err,
            AuthError::AccountSuspended {
                status: AccountStatus::Deleted
            }
        ));
        assert_eq!(h.accounts.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(h.metrics.rejection_count("account_suspended"), 1);
    }

    #[tokio::test]
    async fn altered_signature_stops_at_the_verifier() {
        let h = harness(AccountStatus::Verified).await;
        // Unverified email would fail the permission stage if it were reached.
        let mut claims = default_claims("user-1");
        claims["email_verified"] = false.into();
        let header = header_for(&claims);
        let tampered = format!("{}xx", header.trim_end_matches(|c: char| c != '.'));

        let err = h.pipeline.run(Some(&tampered), &USER_ROLE).await.unwrap_err();

        assert_eq!(err.category(), FailureCategory::Unauthenticated);
        assert!(!matches!(err, AuthError::EmailNotVerified));
        assert_eq!(h.accounts.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn permission_failure_never_touches_the_account_store() {
        let h = harness(AccountStatus::Verified).await;
        let header = header_for(&default_claims("user-1"));

        let err = h
            .pipeline
            .run(Some(&header), &["fapi-user", "gateway-admin"])
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InsufficientPrivileges { .. }));
        assert_eq!(h.accounts.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(h.metrics.rejection_count("insufficient_privileges"), 1);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let h = harness(AccountStatus::Verified).await;
        let header = header_for(&default_claims("someone-else"));

        let err = h.pipeline.run(Some(&header), &USER_ROLE).await.unwrap_err();
        assert_eq!(err.category(), FailureCategory::NotFound);
    }

    #[tokio::test]
    async fn missing_header_is_counted_once() {
        let h = harness(AccountStatus::Verified).await;

        let err = h.pipeline.run::<&str>(None, &[]).await.unwrap_err();

        assert!(matches!(err, AuthError::MissingCredentials));
        assert_eq!(h.metrics.rejection_count("missing_credentials"), 1);
        assert_eq!(h.metrics.success_count(), 0);
    }

    #[tokio::test]
    async fn stages_can_be_driven_individually() {
        let h = harness(AccountStatus::Verified).await;
        let header = header_for(&default_claims("user-1"));

        let token = h.pipeline.authenticate(Some(&header)).await.unwrap();
        let token = h.pipeline.authorize(token, &USER_ROLE).unwrap();
        let (token, account) = h.pipeline.admit(token).await.unwrap().into_parts();

        assert_eq!(token.subject(), account.id);
    }
}
