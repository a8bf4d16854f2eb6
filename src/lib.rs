//! Context-scoped multi-cluster transport router.
//!
//! A pluggable HTTP transport layer that intercepts outgoing API requests,
//! picks a target cluster from the call's routing context, and rewrites the
//! request to reach that cluster through a single shared gateway — while
//! staying a drop-in `tower::Service` so watches, caches and existing client
//! error handling keep working unmodified.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller                        ┌─────────────────────────────────────┐
//!   with_cluster("west-1", …)     │       MULTI-CLUSTER TRANSPORT       │
//!   ─────────────────────────────▶│  cluster/    transport/             │
//!                                 │  context ──▶ rewrite ──▶ wrapped    │──▶ gateway ──▶ cluster
//!                                 │  (id?)      (authority   transport  │
//!                                 │              + path)   (TLS, creds) │
//!   cache consumers               │                                     │
//!   Reflector::run ──────────────▶│  cache/ (list+watch over the same   │
//!   has_synced / wait_synced      │          routed transport)          │
//!                                 └─────────────────────────────────────┘
//! ```
//!
//! Two transports share the rewrite step: [`GatewayTransport`] routes each
//! request from the caller's context; [`BoundClusterTransport`] is fixed to
//! one cluster at construction and adds header-injection and
//! response-filter hooks.

// Core subsystems
pub mod cluster;
pub mod config;
pub mod transport;

// Consumers
pub mod cache;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use cluster::{attach_cluster, with_cluster, ClusterId, InvalidClusterId};
pub use config::{load_config, GatewayConfig};
pub use lifecycle::{Shutdown, ShutdownSignal};
pub use transport::{
    BoundClusterLayer, BoundClusterTransport, GatewayEndpoint, GatewayLayer, GatewayTransport,
    RouteError,
};
