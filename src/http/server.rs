//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every route
//! - Wire up middleware (tracing, request ID, CORS, JSON route deadline)
//! - Bind the server to a listener and drain it on shutdown
//! - End in-flight relays when the server stops

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::FromRef,
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::request::{request_span, UuidRequestId, X_REQUEST_ID};
use crate::http::{api, cors, deadline::json_deadline};
use crate::providers::{
    InnertubeClient, MediaManifestProvider, MetadataProvider, SuggestClient, VideoInfoClient, YtDlp,
};
use crate::proxy::{handler::video_proxy, ProxyError, StreamProxy};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub proxy: Arc<StreamProxy>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub manifests: Arc<dyn MediaManifestProvider>,
    pub suggest: Arc<SuggestClient>,
    pub video_info: Arc<VideoInfoClient>,
}

impl FromRef<AppState> for Arc<StreamProxy> {
    fn from_ref(state: &AppState) -> Self {
        state.proxy.clone()
    }
}

/// Metadata and manifest backends. Swapped for in-process fakes in tests.
#[derive(Clone)]
pub struct Providers {
    pub metadata: Arc<dyn MetadataProvider>,
    pub manifests: Arc<dyn MediaManifestProvider>,
}

impl Providers {
    /// The youtubei client and the `yt-dlp` extractor, as configured.
    pub fn from_config(config: &GatewayConfig, client: reqwest::Client) -> Self {
        Self {
            metadata: Arc::new(InnertubeClient::new(client, &config.metadata)),
            manifests: Arc::new(YtDlp::new(&config.extractor)),
        }
    }
}

/// Client shared by the JSON routes. The proxy keeps its own, unpooled one.
fn api_client(config: &GatewayConfig) -> Result<reqwest::Client, ProxyError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(config.proxy.user_agent.as_str())
        .connect_timeout(config.proxy.connect_timeout())
        .timeout(Duration::from_secs(config.metadata.request_timeout_secs));
    if !config.proxy.use_env_proxy {
        builder = builder.no_proxy();
    }
    builder.build().map_err(ProxyError::Client)
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
    relays: CancellationToken,
}

impl HttpServer {
    /// Create a server backed by the real providers.
    pub fn new(config: GatewayConfig) -> Result<Self, ProxyError> {
        let client = api_client(&config)?;
        let providers = Providers::from_config(&config, client.clone());
        Self::assemble(config, client, providers)
    }

    /// Create a server with the given metadata and manifest providers.
    pub fn with_providers(config: GatewayConfig, providers: Providers) -> Result<Self, ProxyError> {
        let client = api_client(&config)?;
        Self::assemble(config, client, providers)
    }

    fn assemble(
        config: GatewayConfig,
        client: reqwest::Client,
        providers: Providers,
    ) -> Result<Self, ProxyError> {
        let relays = CancellationToken::new();
        let proxy = Arc::new(StreamProxy::new(config.proxy.clone(), relays.clone())?);

        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            proxy,
            metadata: providers.metadata,
            manifests: providers.manifests,
            suggest: Arc::new(SuggestClient::new(client.clone(), &config.suggest)),
            video_info: Arc::new(VideoInfoClient::new(client, &config.video_info)),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            relays,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Only the JSON routes run under `timeouts.request_secs`. The proxy
    /// routes bound the upstream head wait themselves and then stream
    /// without a total limit.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let limit = Duration::from_secs(config.timeouts.request_secs);
        let json = Router::new()
            .route("/", get(api::index))
            .route("/api/suggest", get(api::suggest))
            .route("/api/stream/{video_id}", get(api::stream_info))
            .route("/api/video", get(api::video))
            .route("/api/search", get(api::search))
            .route("/api/comments", get(api::comments))
            .route("/api/fvideo", get(api::home_feed))
            .route("/api/ytdlp", get(api::ytdlp))
            .route_layer(middleware::from_fn_with_state(limit, json_deadline));

        let routes = Router::new()
            .merge(json)
            .route("/api/video-proxy", get(video_proxy))
            .route("/proxy", get(video_proxy))
            .fallback(|| async { StatusCode::NOT_FOUND })
            .with_state(state);

        cors::with_cors(routes)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// Run the server until `shutdown` fires, then drain open connections.
    ///
    /// In-flight relays are cancelled when the signal arrives so that
    /// draining does not wait on long media transfers.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let relays = self.relays.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
                relays.cancel();
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
