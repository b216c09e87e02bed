//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + PORT env
//!     → loader.rs (parse, deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    ExtractorConfig, GatewayConfig, ListenerConfig, MetadataConfig, ObservabilityConfig,
    StreamProxyConfig, SuggestConfig, TimeoutConfig, VideoInfoConfig,
};
