// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use access_gateway::{
    api::router,
    auth::{
        AccessPipeline, AccountStatusGate, HttpKeySetFetcher, JwksCache, JwksCacheConfig,
        TokenVerifier, VerifierConfig,
    },
    cache::{InMemoryRemoteCache, RedisCache, RemoteCache},
    config::{GatewayConfig, LogFormat, DEFAULT_LOG_FILTER},
    jwks_refresher::JwksRefresher,
    metrics::GatewayMetrics,
    models::{Account, AccountStatus},
    state::AppState,
    store::InMemoryAccountStore,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = GatewayConfig::from_env()?;
    init_tracing(&config);

    if config.is_insecure_provider() {
        warn!(
            url = %config.provider_url,
            "Identity provider URL is not HTTPS; signing keys are fetched unencrypted"
        );
    }

    let metrics = GatewayMetrics::new()?;

    let remote: Arc<dyn RemoteCache> = match config.cache_url {
        Some(ref url) => Arc::new(RedisCache::connect(url).await?),
        None => {
            warn!("CACHE_URL not set, shared JWKS tier is local to this instance");
            Arc::new(InMemoryRemoteCache::new())
        }
    };

    let fetcher = HttpKeySetFetcher::new(config.jwks_url.clone(), config.fetch_timeout)?;
    let jwks = JwksCache::new(
        Arc::new(fetcher),
        remote,
        JwksCacheConfig::new(config.jwks_cache_key())
            .with_remote_ttl(config.remote_ttl)
            .with_local_max_age(config.local_max_age)
            .with_local_max_entries(config.local_max_entries),
        metrics.clone(),
    );

    let refresher = JwksRefresher::new(jwks.clone(), config.refresh_interval);
    if refresher.refresh_now().await.is_none() {
        warn!(url = %config.jwks_url, "Starting without signing keys; they load on first use");
    }

    // The relational account store is external; seed the in-memory one.
    let accounts = InMemoryAccountStore::new();
    if let Some(ref id) = config.seed_verified_account_id {
        accounts
            .insert(Account::new(
                id.clone(),
                id.clone(),
                format!("{id}@localhost"),
                AccountStatus::Verified,
            ))
            .await;
        info!(account_id = %id, "Seeded verified account");
    }

    let verifier = TokenVerifier::new(
        jwks,
        VerifierConfig::new(config.issuer.clone())
            .with_audience(config.audience.clone())
            .with_leeway(config.leeway.as_secs()),
    );
    let pipeline = AccessPipeline::new(
        verifier,
        AccountStatusGate::new(Arc::new(accounts)),
        metrics.clone(),
    );
    let state = AppState::new(pipeline, metrics)
        .with_roles(config.user_role.clone(), config.admin_role.clone())
        .with_refresher(refresher.clone());

    let shutdown = CancellationToken::new();
    let refresher_task = tokio::spawn(refresher.run(shutdown.clone()));

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, issuer = %config.issuer, "Access gateway listening (docs at /docs)");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    refresher_task.await?;
    info!("Access gateway stopped");
    Ok(())
}

fn init_tracing(config: &GatewayConfig) {
    if config.disable_logging {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

/// Resolves on Ctrl-C or SIGTERM and cancels `shutdown`.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
