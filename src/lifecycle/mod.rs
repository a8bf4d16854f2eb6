//! Lifecycle management subsystem.
//!
//! # Design Decisions
//! - Watch loops stop at their next await point when shutdown triggers
//! - The stop request is level-triggered state, not an event: subscribing
//!   after the trigger still observes it

pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownSignal};
