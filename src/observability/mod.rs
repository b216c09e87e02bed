//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and relay tasks produce:
//!     → logging.rs (structured tracing events, request IDs in spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
