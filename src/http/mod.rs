//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (request ID, span)
//!     → cors.rs (preflight, CORS headers)
//!     → server.rs (routing)
//!     → deadline.rs → api.rs (JSON routes) | proxy::handler (media relay)
//!     → error.rs (JSON error bodies)
//! ```

pub mod api;
pub mod cors;
pub mod deadline;
pub mod error;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer, Providers};
