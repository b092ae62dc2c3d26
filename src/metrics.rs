// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Prometheus metrics for the access pipeline and the JWKS cache.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

const NAMESPACE: &str = "access_gateway";

/// Counters shared by the pipeline, the JWKS cache and `/metrics`.
///
/// Cloning is cheap; all clones update the same registry.
#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    rejections: IntCounterVec,
    successes: IntCounter,
    jwks_fetches: IntCounterVec,
    jwks_cache_hits: IntCounterVec,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let rejections = IntCounterVec::new(
            Opts::new("auth_rejections_total", "Rejected access attempts by reason")
                .namespace(NAMESPACE),
            &["reason"],
        )?;
        registry.register(Box::new(rejections.clone()))?;

        let successes = IntCounter::with_opts(
            Opts::new("auth_success_total", "Requests admitted by the access pipeline")
                .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(successes.clone()))?;

        let jwks_fetches = IntCounterVec::new(
            Opts::new("jwks_fetch_total", "Key set fetches from the identity provider")
                .namespace(NAMESPACE),
            &["trigger", "outcome"],
        )?;
        registry.register(Box::new(jwks_fetches.clone()))?;

        let jwks_cache_hits = IntCounterVec::new(
            Opts::new("jwks_cache_hits_total", "Key set reads served from a cache tier")
                .namespace(NAMESPACE),
            &["tier"],
        )?;
        registry.register(Box::new(jwks_cache_hits.clone()))?;

        Ok(Self {
            registry,
            rejections,
            successes,
            jwks_fetches,
            jwks_cache_hits,
        })
    }

    pub fn record_rejection(&self, reason: &str) {
        self.rejections.with_label_values(&[reason]).inc();
    }

    pub fn record_success(&self) {
        self.successes.inc();
    }

    pub fn record_jwks_fetch(&self, trigger: &str, outcome: &str) {
        self.jwks_fetches
            .with_label_values(&[trigger, outcome])
            .inc();
    }

    pub fn record_cache_hit(&self, tier: &str) {
        self.jwks_cache_hits.with_label_values(&[tier]).inc();
    }

    pub fn rejection_count(&self, reason: &str) -> u64 {
        self.rejections.with_label_values(&[reason]).get()
    }

    pub fn success_count(&self) -> u64 {
        self.successes.get()
    }

    pub fn jwks_fetch_count(&self, trigger: &str, outcome: &str) -> u64 {
        self.jwks_fetches
            .with_label_values(&[trigger, outcome])
            .get()
    }

    pub fn cache_hit_count(&self, tier: &str) -> u64 {
        self.jwks_cache_hits.with_label_values(&[tier]).get()
    }

    /// Content type of [`GatewayMetrics::render`] output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
