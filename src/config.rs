// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the Webmention receiver.
//!
//! Every field has a serde default so a partial config (or none at all)
//! yields a working receiver for `helvetica.moe/posts`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration for the Webmention receiver service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Which targets this receiver accepts mentions for
    #[serde(default)]
    pub receiver: ReceiverConfig,

    /// Outbound source fetching
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Mention persistence
    #[serde(default)]
    pub store: StoreConfig,

    /// WebFinger identity redirects
    #[serde(default)]
    pub webfinger: WebfingerConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Target ownership policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Hostname targets must carry (default: helvetica.moe)
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Path namespace targets must live under (default: /posts)
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Source fetching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Upper bound for one fetch, redirects and body included (default: 10000)
    #[serde(default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent sent when fetching sources
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `memory` or a path to a SQLite database file (default: memory)
    #[serde(default = "default_store_path")]
    pub path: String,

    /// Maximum keys returned by one listing before it is marked truncated
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

/// WebFinger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebfingerConfig {
    /// Resource → subject redirects, e.g. `acct:me@here` → `acct:me@there`
    #[serde(default = "default_webfinger_accounts")]
    pub accounts: BTreeMap<String, String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_domain() -> String {
    "helvetica.moe".to_string()
}

fn default_namespace() -> String {
    "/posts".to_string()
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    concat!("webmention-receiver/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_store_path() -> String {
    "memory".to_string()
}

fn default_list_limit() -> usize {
    1000
}

fn default_webfinger_accounts() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "acct:a5rocks@helvetica.moe".to_string(),
        "acct:A5rocks@uwu.social".to_string(),
    )])
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            receiver: ReceiverConfig::default(),
            fetch: FetchConfig::default(),
            store: StoreConfig::default(),
            webfinger: WebfingerConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            namespace: default_namespace(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_fetch_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            list_limit: default_list_limit(),
        }
    }
}

impl Default for WebfingerConfig {
    fn default() -> Self {
        Self {
            accounts: default_webfinger_accounts(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl FetchConfig {
    /// Get the fetch timeout duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `BIND_ADDR`: Server bind address
    /// - `RECEIVER_DOMAIN`, `RECEIVER_NAMESPACE`: target policy
    /// - `FETCH_TIMEOUT_MS`, `FETCH_USER_AGENT`: source fetching
    /// - `STORE_PATH`, `STORE_LIST_LIMIT`: persistence
    /// - `WEBFINGER_ACCOUNTS`: comma-separated `resource=subject` pairs
    /// - `METRICS_ENABLED`: expose `/metrics`
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            bind_addr: env_string("BIND_ADDR").unwrap_or(defaults.bind_addr),
            receiver: ReceiverConfig {
                domain: env_string("RECEIVER_DOMAIN").unwrap_or(defaults.receiver.domain),
                namespace: env_string("RECEIVER_NAMESPACE")
                    .unwrap_or(defaults.receiver.namespace),
            },
            fetch: FetchConfig {
                timeout_ms: env_parsed("FETCH_TIMEOUT_MS").unwrap_or(defaults.fetch.timeout_ms),
                user_agent: env_string("FETCH_USER_AGENT").unwrap_or(defaults.fetch.user_agent),
            },
            store: StoreConfig {
                path: env_string("STORE_PATH").unwrap_or(defaults.store.path),
                list_limit: env_parsed("STORE_LIST_LIMIT").unwrap_or(defaults.store.list_limit),
            },
            webfinger: WebfingerConfig {
                accounts: env_string("WEBFINGER_ACCOUNTS")
                    .map(|v| parse_accounts(&v))
                    .unwrap_or(defaults.webfinger.accounts),
            },
            metrics: MetricsConfig {
                enabled: env_parsed("METRICS_ENABLED").unwrap_or(defaults.metrics.enabled),
                ..defaults.metrics
            },
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.trim().parse().ok())
}

/// Parse `resource=subject` pairs separated by commas. Malformed pairs are skipped.
pub fn parse_accounts(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (resource, subject) = pair.split_once('=')?;
            let (resource, subject) = (resource.trim(), subject.trim());
            if resource.is_empty() || subject.is_empty() {
                return None;
            }
            Some((resource.to_string(), subject.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.receiver.domain, "helvetica.moe");
        assert_eq!(config.receiver.namespace, "/posts");
        assert_eq!(config.store.path, "memory");
        assert_eq!(config.fetch.timeout(), Duration::from_secs(10));
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"receiver": {"domain": "example.org"}}"#).unwrap();
        assert_eq!(config.receiver.domain, "example.org");
        assert_eq!(config.receiver.namespace, "/posts");
        assert_eq!(config.store.list_limit, 1000);
    }

    #[test]
    fn test_parse_accounts() {
        let accounts = parse_accounts("acct:a@x.org=acct:b@y.org, broken ,acct:c@x.org = acct:d@y.org");
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts["acct:a@x.org"], "acct:b@y.org");
        assert_eq!(accounts["acct:c@x.org"], "acct:d@y.org");
    }
}
