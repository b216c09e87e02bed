//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gateway_sdk::GatewayClient;
use media_gateway::config::GatewayConfig;
use media_gateway::http::{HttpServer, Providers};
use media_gateway::lifecycle::Shutdown;
use media_gateway::providers::{
    CommentPage, CommentSort, MediaManifest, MediaManifestProvider, MetadataProvider,
    ProviderError, SearchBatch, VideoInfo,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// One request as the mock upstream saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    /// Header names lowercased.
    pub headers: HashMap<String, String>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub enum MockBody {
    /// Sent in one write with a Content-Length.
    Fixed(Vec<u8>),
    /// Sent with chunked transfer encoding, one chunk per `delay`.
    Trickle {
        chunk: Vec<u8>,
        count: usize,
        delay: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: MockBody,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: MockBody::Fixed(body.into()),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn trickle(status: u16, chunk: Vec<u8>, count: usize, delay: Duration) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: MockBody::Trickle { chunk, count, delay },
        }
    }
}

/// Raw-TCP HTTP/1.1 upstream with programmable responses.
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    calls: Arc<AtomicUsize>,
    disconnected: Arc<AtomicBool>,
    chunks_written: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request recorded")
    }

    /// True once a write to a client socket failed.
    pub fn saw_disconnect(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    pub fn chunks_written(&self) -> usize {
        self.chunks_written.load(Ordering::SeqCst)
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        206 => "Partial Content",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        416 => "Range Not Satisfiable",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

async fn read_head(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::with_capacity(2048);
    let mut byte = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut byte).await.ok()?;
        if n == 0 || buf.len() > 64 * 1024 {
            return None;
        }
        buf.extend_from_slice(&byte[..n]);
    }

    let text = String::from_utf8_lossy(&buf);
    let mut lines = text.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    Some(RecordedRequest { method, target, headers })
}

/// Start a mock upstream on an ephemeral port; `respond` decides each answer.
pub async fn start_mock_upstream<F>(respond: F) -> MockUpstream
where
    F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::new(AtomicUsize::new(0));
    let disconnected = Arc::new(AtomicBool::new(false));
    let chunks_written = Arc::new(AtomicUsize::new(0));

    let upstream = MockUpstream {
        addr,
        requests: requests.clone(),
        calls: calls.clone(),
        disconnected: disconnected.clone(),
        chunks_written: chunks_written.clone(),
    };

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let respond = respond.clone();
            let requests = requests.clone();
            let calls = calls.clone();
            let disconnected = disconnected.clone();
            let chunks_written = chunks_written.clone();

            tokio::spawn(async move {
                let Some(request) = read_head(&mut socket).await else {
                    return;
                };
                calls.fetch_add(1, Ordering::SeqCst);
                let response = respond(&request);
                requests.lock().unwrap().push(request);

                let mut head = format!("HTTP/1.1 {} {}\r\n", response.status, reason(response.status));
                for (name, value) in &response.headers {
                    head.push_str(&format!("{name}: {value}\r\n"));
                }
                head.push_str("Connection: close\r\n");

                match response.body {
                    MockBody::Fixed(body) => {
                        head.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));
                        let _ = socket.write_all(head.as_bytes()).await;
                        let _ = socket.write_all(&body).await;
                    }
                    MockBody::Trickle { chunk, count, delay } => {
                        head.push_str("Transfer-Encoding: chunked\r\n\r\n");
                        if socket.write_all(head.as_bytes()).await.is_err() {
                            disconnected.store(true, Ordering::SeqCst);
                            return;
                        }
                        for _ in 0..count {
                            let mut frame = format!("{:x}\r\n", chunk.len()).into_bytes();
                            frame.extend_from_slice(&chunk);
                            frame.extend_from_slice(b"\r\n");
                            if socket.write_all(&frame).await.is_err() {
                                disconnected.store(true, Ordering::SeqCst);
                                return;
                            }
                            chunks_written.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(delay).await;
                        }
                        let _ = socket.write_all(b"0\r\n\r\n").await;
                    }
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    upstream
}

/// Upstream that accepts connections and reads each request but never
/// answers. Returns its address and a count of requests read.
pub async fn start_stalled_upstream() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let seen = seen.clone();
            tokio::spawn(async move {
                if read_head(&mut socket).await.is_some() {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(socket);
            });
        }
    });

    (addr, calls)
}

/// A port nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Poll `condition` every 20ms until it holds or `limit` passes.
pub async fn eventually(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// Config for tests: loopback bind, no env proxies, short timeouts.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.proxy.use_env_proxy = false;
    config.proxy.connect_timeout_secs = 2;
    config.proxy.response_timeout_secs = 5;
    config.proxy.idle_read_timeout_secs = 5;
    config.metadata.request_timeout_secs = 5;
    config
}

pub struct RunningGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn sdk(&self) -> GatewayClient {
        GatewayClient::with_client(http_client(), &format!("http://{}", self.addr))
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig, providers: Providers) -> RunningGateway {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let server = HttpServer::with_providers(config, providers).unwrap();
    let handle = tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });

    RunningGateway { addr, shutdown, handle }
}

/// Gateway with inert providers, for proxy-only tests.
pub async fn start_proxy_gateway() -> RunningGateway {
    start_gateway(test_config(), fake_providers(FakeMetadata::default(), FakeManifests::default())).await
}

pub fn fake_providers(metadata: FakeMetadata, manifests: FakeManifests) -> Providers {
    Providers {
        metadata: Arc::new(metadata),
        manifests: Arc::new(manifests),
    }
}

/// In-process metadata provider serving canned data.
#[derive(Default)]
pub struct FakeMetadata {
    pub info: Option<VideoInfo>,
    /// Search batches; batch `n` links to `token-{n+1}` when one exists.
    pub batches: Vec<Vec<Value>>,
    pub comments: Vec<Value>,
    pub home: Vec<Value>,
    pub last_sort: Mutex<Option<CommentSort>>,
    pub last_search_sort: Mutex<Option<String>>,
    pub search_calls: AtomicUsize,
    /// Delay before every search answer.
    pub stall: Option<Duration>,
}

impl FakeMetadata {
    fn batch(&self, index: usize) -> SearchBatch {
        SearchBatch {
            videos: self.batches.get(index).cloned().unwrap_or_default(),
            continuation: (index + 1 < self.batches.len()).then(|| format!("token-{}", index + 1)),
        }
    }
}

#[async_trait]
impl MetadataProvider for FakeMetadata {
    async fn video_info(&self, _id: &str) -> Result<VideoInfo, ProviderError> {
        self.info.clone().ok_or(ProviderError::Missing("videoDetails"))
    }

    async fn search(&self, _query: &str, sort_by: Option<&str>) -> Result<SearchBatch, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_search_sort.lock().unwrap() = sort_by.map(str::to_string);
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        Ok(self.batch(0))
    }

    async fn search_continuation(&self, token: &str) -> Result<SearchBatch, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let index = token
            .strip_prefix("token-")
            .and_then(|n| n.parse().ok())
            .ok_or(ProviderError::Missing("continuation"))?;
        Ok(self.batch(index))
    }

    async fn comments(&self, id: &str, sort: CommentSort) -> Result<CommentPage, ProviderError> {
        *self.last_sort.lock().unwrap() = Some(sort);
        Ok(CommentPage {
            comments: self.comments.clone(),
            continuation: Some(format!("{id}-more")),
        })
    }

    async fn home_feed(&self) -> Result<Vec<Value>, ProviderError> {
        Ok(self.home.clone())
    }
}

/// In-process manifest provider: a fixed manifest or a fixed failure.
#[derive(Default)]
pub struct FakeManifests {
    pub manifest: Option<Value>,
    pub stderr: Option<String>,
    pub raw_output: Option<String>,
    pub requested: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaManifestProvider for FakeManifests {
    async fn manifest(&self, video_url: &str) -> Result<MediaManifest, ProviderError> {
        self.requested.lock().unwrap().push(video_url.to_string());
        if let Some(stderr) = &self.stderr {
            return Err(ProviderError::Extractor {
                status: "exit status: 1".into(),
                stderr: stderr.clone(),
            });
        }
        if let Some(raw) = &self.raw_output {
            return media_gateway::providers::ytdlp::parse_manifest(raw.as_bytes());
        }
        let manifest = self.manifest.clone().unwrap_or_else(|| json!({}));
        Ok(serde_json::from_value(manifest)?)
    }
}

/// `count` numbered videos starting at `first`.
pub fn videos(first: usize, count: usize) -> Vec<Value> {
    (first..first + count)
        .map(|i| json!({ "id": format!("v{i}"), "title": format!("Video {i}") }))
        .collect()
}
