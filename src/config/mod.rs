//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → transports and caches built from it at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routing targets never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{CacheConfig, ClusterTargetConfig, GatewayConfig, GatewaySection, ObservabilityConfig};
pub use validation::{validate_config, ValidationError};
