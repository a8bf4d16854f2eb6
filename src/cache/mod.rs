//! Watch-based cache consumer.
//!
//! # Data Flow
//! ```text
//! routed transport (basic or cluster-bound)
//!     → reflector.rs (list, then watch as a line-delimited JSON stream)
//!     → store.rs (local mirror, delta computation)
//!     → registered event handlers (added / updated / removed)
//!
//! sync status:
//!     reflector marks synced after the initial listing is applied
//!     → has_synced() poll, or wait_synced() await with timeout
//! ```
//!
//! The cache consumes the transport transparently; routing happens a layer
//! below and every list/watch request reaches the cluster the transport
//! decides on.

pub mod object;
pub mod reflector;
pub mod store;

pub use object::{ApiObject, ObjectKey, ObjectList, ObjectMeta, WatchEvent, WatchEventKind};
pub use reflector::{CacheHandle, EventHandler, Reflector, SyncError};
pub use store::{CacheEvent, Store};
