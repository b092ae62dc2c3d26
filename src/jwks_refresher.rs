// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # JWKS Refresher
//!
//! Background task that re-fetches the realm's signing keys on a fixed
//! period, independent of request traffic. A burst of requests right after
//! a provider key rotation then finds the new key already cached instead of
//! queueing behind one cold fetch.
//!
//! ## Failure containment
//!
//! A failed refresh is logged at error level and otherwise ignored. The
//! cache keeps serving the previous snapshot until its own TTL runs out.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`; the loop exits on the next
//! cancellation, even mid-sleep.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::auth::JwksCache;

/// Default interval between refreshes (10 minutes).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(600);

/// Periodic JWKS cache refresh.
///
/// Cloned into `AppState` for the admin refresh endpoint.
#[derive(Clone)]
pub struct JwksRefresher {
    jwks: JwksCache,
    interval: Duration,
}

impl JwksRefresher {
    pub fn new(jwks: JwksCache, interval: Duration) -> Self {
        Self { jwks, interval }
    }

    /// Run the refresh loop until the cancellation token is triggered.
    ///
    /// The first refresh happens one full interval after start; warm the
    /// cache separately at startup. Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(refresher.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "JWKS refresher starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("JWKS refresher shutting down");
                    return;
                }
            }

            self.refresh_now().await;
        }
    }

    /// One refresh, for the schedule and for operational tooling.
    ///
    /// Returns the number of keys now cached, or `None` when the refresh
    /// failed (already logged).
    pub async fn refresh_now(&self) -> Option<usize> {
        match self.jwks.refresh().await {
            Ok(snapshot) => {
                info!(keys = snapshot.len(), "JWKS refreshed");
                Some(snapshot.len())
            }
            Err(e) => {
                error!(error = %e, "JWKS refresh failed, keeping previous key set");
                None
            }
        }
    }
}
