//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! transport + cache produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, remote)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Recording is fire-and-forget and never touches the response path
//! - Metrics are labelled by cluster, never by request path (unbounded)

pub mod logging;
pub mod metrics;
