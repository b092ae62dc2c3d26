// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3000` |
//! | `KEYCLOAK_URL` | Identity provider base URL | Required |
//! | `KEYCLOAK_FAPI_REALM` | Realm whose keys sign access tokens | `fapi` |
//! | `KEYCLOAK_ISSUER` | Expected `iss` claim | `<base>/realms/<realm>` |
//! | `KEYCLOAK_AUDIENCE` | Expected `aud` claim | Not checked |
//! | `KEYCLOAK_FAPI_USER_ROLE` | Realm role required on `/v1` routes | `fapi-user` |
//! | `GATEWAY_ADMIN_ROLE` | Realm role required on admin routes | `gateway-admin` |
//! | `CACHE_URL` | Redis URL for the shared JWKS tier | In-process |
//! | `JWKS_CACHE_KEY_PREFIX` | Shared JWKS key prefix | `gateway:jwks` |
//! | `JWKS_REMOTE_TTL` | Shared tier TTL | `5m` |
//! | `JWKS_LOCAL_MAX_AGE` | Local tier max age | `10m` |
//! | `JWKS_LOCAL_MAX_ENTRIES` | Local tier capacity | `10` |
//! | `JWKS_FETCH_TIMEOUT` | Key endpoint timeout | `10s` |
//! | `JWKS_REFRESH_INTERVAL` | Background refresh period | `10m` |
//! | `CLOCK_SKEW_LEEWAY` | Leeway on `exp` / `nbf` | `60s` |
//! | `SEED_VERIFIED_ACCOUNT_ID` | Seed one `VERIFIED` account | None |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `DISABLE_LOGGING` | Skip log subscriber setup | `false` |
//!
//! Durations are written as `<integer><unit>` with unit `s`, `m`, `h` or `d`.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const KEYCLOAK_URL_ENV: &str = "KEYCLOAK_URL";
pub const KEYCLOAK_REALM_ENV: &str = "KEYCLOAK_FAPI_REALM";
pub const KEYCLOAK_ISSUER_ENV: &str = "KEYCLOAK_ISSUER";
pub const KEYCLOAK_AUDIENCE_ENV: &str = "KEYCLOAK_AUDIENCE";
pub const USER_ROLE_ENV: &str = "KEYCLOAK_FAPI_USER_ROLE";
pub const ADMIN_ROLE_ENV: &str = "GATEWAY_ADMIN_ROLE";
pub const CACHE_URL_ENV: &str = "CACHE_URL";
pub const JWKS_CACHE_KEY_PREFIX_ENV: &str = "JWKS_CACHE_KEY_PREFIX";
pub const JWKS_REMOTE_TTL_ENV: &str = "JWKS_REMOTE_TTL";
pub const JWKS_LOCAL_MAX_AGE_ENV: &str = "JWKS_LOCAL_MAX_AGE";
pub const JWKS_LOCAL_MAX_ENTRIES_ENV: &str = "JWKS_LOCAL_MAX_ENTRIES";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT";
pub const JWKS_REFRESH_INTERVAL_ENV: &str = "JWKS_REFRESH_INTERVAL";
pub const CLOCK_SKEW_LEEWAY_ENV: &str = "CLOCK_SKEW_LEEWAY";
pub const SEED_VERIFIED_ACCOUNT_ENV: &str = "SEED_VERIFIED_ACCOUNT_ID";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const DISABLE_LOGGING_ENV: &str = "DISABLE_LOGGING";

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("invalid duration `{0}`, expected <integer><s|m|h|d>")]
    InvalidInterval(String),
}

/// Parse a duration such as `30s`, `10m`, `2h` or `1d`. Zero is rejected.
pub fn parse_interval(value: &str) -> Result<Duration, ConfigError> {
    let value = value.trim();
    let invalid = || ConfigError::InvalidInterval(value.to_string());

    let split = value.len().checked_sub(1).ok_or_else(invalid)?;
    if !value.is_char_boundary(split) {
        return Err(invalid());
    }
    let (amount, unit) = value.split_at(split);

    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: u64 = amount.parse().map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }

    let seconds = match unit {
        "s" => Some(amount),
        "m" => amount.checked_mul(60),
        "h" => amount.checked_mul(60 * 60),
        "d" => amount.checked_mul(24 * 60 * 60),
        _ => None,
    }
    .ok_or_else(invalid)?;

    Ok(Duration::from_secs(seconds))
}

/// Reduce a provider URL to scheme, host and port.
pub fn provider_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: KEYCLOAK_URL_ENV,
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    url.set_path("");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Logging output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::Invalid {
                var: LOG_FORMAT_ENV,
                reason: format!("unknown format `{other}`"),
            }),
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Provider base URL (scheme, host and port only).
    pub provider_url: Url,
    pub realm: String,
    pub issuer: String,
    pub audience: Option<String>,
    pub jwks_url: String,
    pub user_role: String,
    pub admin_role: String,
    pub cache_url: Option<String>,
    pub cache_key_prefix: String,
    pub remote_ttl: Duration,
    pub local_max_age: Duration,
    pub local_max_entries: usize,
    pub fetch_timeout: Duration,
    pub refresh_interval: Duration,
    pub leeway: Duration,
    pub seed_verified_account_id: Option<String>,
    pub log_format: LogFormat,
    pub disable_logging: bool,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let interval = |name: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            get(name).map_or(Ok(default), |v| parse_interval(&v))
        };

        let port = match get(PORT_ENV) {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                var: PORT_ENV,
                reason: format!("`{v}` is not a port number"),
            })?,
            None => 3000,
        };

        let provider_url = provider_base_url(
            &get(KEYCLOAK_URL_ENV).ok_or(ConfigError::Missing(KEYCLOAK_URL_ENV))?,
        )?;
        let realm = get(KEYCLOAK_REALM_ENV).unwrap_or_else(|| "fapi".to_string());
        let origin = provider_url.origin().ascii_serialization();
        let issuer = get(KEYCLOAK_ISSUER_ENV).unwrap_or_else(|| format!("{origin}/realms/{realm}"));
        let jwks_url = jwks_url(&provider_url, &realm)?;

        let local_max_entries = match get(JWKS_LOCAL_MAX_ENTRIES_ENV) {
            Some(v) => v
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: JWKS_LOCAL_MAX_ENTRIES_ENV,
                    reason: format!("`{v}` is not a positive integer"),
                })?,
            None => 10,
        };

        let log_format = get(LOG_FORMAT_ENV)
            .map(|v| v.parse::<LogFormat>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            provider_url,
            realm,
            issuer,
            audience: get(KEYCLOAK_AUDIENCE_ENV),
            jwks_url,
            user_role: get(USER_ROLE_ENV).unwrap_or_else(|| "fapi-user".to_string()),
            admin_role: get(ADMIN_ROLE_ENV).unwrap_or_else(|| "gateway-admin".to_string()),
            cache_url: get(CACHE_URL_ENV),
            cache_key_prefix: get(JWKS_CACHE_KEY_PREFIX_ENV)
                .unwrap_or_else(|| "gateway:jwks".to_string()),
            remote_ttl: interval(JWKS_REMOTE_TTL_ENV, Duration::from_secs(300))?,
            local_max_age: interval(JWKS_LOCAL_MAX_AGE_ENV, Duration::from_secs(600))?,
            local_max_entries,
            fetch_timeout: interval(JWKS_FETCH_TIMEOUT_ENV, Duration::from_secs(10))?,
            refresh_interval: interval(JWKS_REFRESH_INTERVAL_ENV, Duration::from_secs(600))?,
            leeway: interval(CLOCK_SKEW_LEEWAY_ENV, Duration::from_secs(60))?,
            seed_verified_account_id: get(SEED_VERIFIED_ACCOUNT_ENV),
            log_format,
            disable_logging: get(DISABLE_LOGGING_ENV)
                .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1"),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: HOST_ENV,
                reason: e.to_string(),
            })
    }

    /// Shared cache key of the realm's key set.
    pub fn jwks_cache_key(&self) -> String {
        format!("{}:{}", self.cache_key_prefix, self.realm)
    }

    /// Whether keys are fetched over plain HTTP.
    pub fn is_insecure_provider(&self) -> bool {
        self.provider_url.scheme() == "http"
    }
}

/// `<base>/realms/<realm>/protocol/openid-connect/certs`
fn jwks_url(base: &Url, realm: &str) -> Result<String, ConfigError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ConfigError::Invalid {
            var: KEYCLOAK_URL_ENV,
            reason: "URL cannot carry a path".to_string(),
        })?
        .clear()
        .extend(["realms", realm, "protocol", "openid-connect", "certs"]);
    Ok(url.into())
}
