//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the routing
//! layer. All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::transport::DEFAULT_ROUTE_PREFIX;

/// Root configuration for the multi-cluster transport.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Shared gateway endpoint settings.
    pub gateway: GatewaySection,

    /// Per-cluster targets for the cluster-bound transport.
    pub clusters: Vec<ClusterTargetConfig>,

    /// Watch-cache behavior.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Shared gateway endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Gateway base URL (e.g. "https://gateway.example:6443").
    pub url: String,

    /// Path prefix the gateway serves clusters under; the cluster name is
    /// the path segment immediately after it.
    pub route_prefix: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080".to_string(),
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
        }
    }
}

/// Per-cluster target configuration for the cluster-bound transport.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClusterTargetConfig {
    /// Cluster name as registered with the gateway.
    pub name: String,

    /// Optional gateway URL override for this cluster only.
    pub url: Option<String>,

    /// Extra headers added to every request to this cluster.
    pub extra_headers: BTreeMap<String, String>,

    /// Optional bearer token sent as the Authorization header.
    pub bearer_token: Option<String>,
}

/// Watch-cache behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long `wait_synced` waits before giving up, in seconds.
    pub sync_timeout_secs: u64,

    /// Base delay before re-establishing a broken watch, in milliseconds.
    pub relist_base_delay_ms: u64,

    /// Maximum delay between re-list attempts, in milliseconds.
    pub relist_max_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sync_timeout_secs: 60,
            relist_base_delay_ms: 500,
            relist_max_delay_ms: 30_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
