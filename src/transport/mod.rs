//! Multi-cluster transport core.
//!
//! # Data Flow
//! ```text
//! caller builds request (cluster-agnostic base URL)
//!     → cluster/context.rs (identifier from extensions or task scope)
//!     → rewrite.rs (authority + path point at the gateway)
//!     → wrapped transport (network I/O, credentials, TLS)
//!     → response returned unchanged (basic) or filtered (enhanced)
//! ```
//!
//! Two operating modes share the rewrite step:
//! - [`GatewayTransport`] routes per request from the caller's context;
//!   one instance serves any number of clusters.
//! - [`BoundClusterTransport`] is fixed to one cluster at construction and
//!   adds header-injection and response-filter hooks; one instance per
//!   cluster, suited to building one cache stack per cluster.

pub mod basic;
pub mod enhanced;
pub mod rewrite;

use thiserror::Error;

use crate::cluster::InvalidClusterId;

pub use basic::{GatewayLayer, GatewayTransport};
pub use enhanced::{
    BoundClusterLayer, BoundClusterTransport, HeaderInjector, RequestIdInjector, ResponseFilter,
    StaticHeaderInjector,
};
pub use rewrite::{rewrite_request, GatewayEndpoint, InvalidEndpoint, DEFAULT_ROUTE_PREFIX};

/// Boxed error type shared with the wrapped transport, so its failures
/// surface to callers byte-identical to an unwrapped client.
pub type BoxError = tower::BoxError;

/// Errors produced by the routing layer itself.
///
/// Network failures from the wrapped transport are *not* represented here;
/// they pass through unmodified and are never retried.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A cluster name failed path-segment validation. Nothing was sent.
    #[error(transparent)]
    InvalidClusterId(#[from] InvalidClusterId),

    /// A gateway address was unusable as a rewrite target.
    #[error(transparent)]
    InvalidEndpoint(#[from] InvalidEndpoint),

    /// The original request had no rewritable target URL.
    #[error("request cannot be rewritten: {0}")]
    MalformedRequest(String),

    /// A configured extension hook failed; wraps the underlying cause.
    #[error("{stage} failed: {source}")]
    Extension {
        /// Which hook chain failed.
        stage: &'static str,
        /// The hook's own error.
        #[source]
        source: BoxError,
    },
}
