//! Media gateway library: a range-aware streaming proxy plus the JSON API
//! used by the video front-end.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod providers;
pub mod proxy;

pub use config::GatewayConfig;
pub use http::{HttpServer, Providers};
pub use lifecycle::Shutdown;
pub use proxy::StreamProxy;
