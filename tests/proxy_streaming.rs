//! End-to-end tests for the media proxy route.

mod common;

use std::time::Duration;

use common::*;
use reqwest::StatusCode;

fn range_upstream_body() -> Vec<u8> {
    (0..=255u8).cycle().take(1000).collect()
}

/// Serves 1000 bytes, honouring a single `bytes=a-b` range.
async fn start_media_upstream() -> MockUpstream {
    start_mock_upstream(|request| {
        let body = range_upstream_body();
        let response = match request.header("range").and_then(|r| r.strip_prefix("bytes=")) {
            Some(spec) => {
                let (start, end) = spec.split_once('-').unwrap();
                let start: usize = start.parse().unwrap();
                let end: usize = end.parse().unwrap_or(body.len() - 1);
                MockResponse::new(206, body[start..=end].to_vec())
                    .header("Content-Type", "video/mp4")
                    .header("Accept-Ranges", "bytes")
                    .header("Content-Range", &format!("bytes {start}-{end}/{}", body.len()))
            }
            None => MockResponse::new(200, body)
                .header("Content-Type", "video/mp4")
                .header("Accept-Ranges", "bytes"),
        };
        response
            .header("Set-Cookie", "session=secret")
            .header("X-Upstream-Node", "edge-7")
    })
    .await
}

#[tokio::test]
async fn missing_url_is_rejected_without_upstream_call() {
    let upstream = start_media_upstream().await;
    let gateway = start_proxy_gateway().await;
    let client = http_client();

    let res = client.get(gateway.url("/api/video-proxy")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.bytes().await.unwrap().is_empty());

    let res = client
        .get(gateway.url("/api/video-proxy?url=not%20a%20url"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn full_body_without_range() {
    let upstream = start_media_upstream().await;
    let gateway = start_proxy_gateway().await;

    let res = gateway.sdk().proxy(&upstream.url("/video.mp4"), None).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "video/mp4");
    assert_eq!(res.headers()["content-length"], "1000");
    assert_eq!(res.headers()["accept-ranges"], "bytes");
    assert_eq!(res.bytes().await.unwrap().to_vec(), range_upstream_body());

    let seen = upstream.last_request();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.target, "/video.mp4");
    assert_eq!(seen.header("range"), None);
    assert!(seen.header("user-agent").unwrap().contains("Chrome/120"));
    assert_eq!(seen.header("referer"), Some("https://www.youtube.com/"));
}

#[tokio::test]
async fn range_is_forwarded_and_partial_content_mirrored() {
    let upstream = start_media_upstream().await;
    let gateway = start_proxy_gateway().await;

    let res = gateway
        .sdk()
        .proxy(&upstream.url("/video.mp4?itag=18&sig=abc"), Some("bytes=100-199"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.headers()["content-range"], "bytes 100-199/1000");
    assert_eq!(res.headers()["content-length"], "100");
    let body = res.bytes().await.unwrap();
    assert_eq!(body.to_vec(), range_upstream_body()[100..200].to_vec());

    let seen = upstream.last_request();
    assert_eq!(seen.target, "/video.mp4?itag=18&sig=abc");
    assert_eq!(seen.header("range"), Some("bytes=100-199"));
}

#[tokio::test]
async fn upstream_only_headers_do_not_leak() {
    let upstream = start_media_upstream().await;
    let gateway = start_proxy_gateway().await;

    let res = gateway.sdk().proxy(&upstream.url("/v.mp4"), Some("bytes=0-9")).await.unwrap();
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert!(res.headers().get("set-cookie").is_none());
    assert!(res.headers().get("x-upstream-node").is_none());
}

#[tokio::test]
async fn upstream_error_status_is_mirrored_with_empty_body() {
    for status in [403u16, 404] {
        let upstream = start_mock_upstream(move |_| {
            MockResponse::new(status, "signature expired").header("Content-Type", "text/plain")
        })
        .await;
        let gateway = start_proxy_gateway().await;

        let res = gateway.sdk().proxy(&upstream.url("/v.mp4"), None).await.unwrap();
        assert_eq!(res.status().as_u16(), status);
        assert!(res.headers().get("content-type").is_none());
        assert!(res.bytes().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn unreachable_upstream_is_500() {
    let addr = closed_port().await;
    let gateway = start_proxy_gateway().await;

    let res = gateway
        .sdk()
        .proxy(&format!("http://{addr}/v.mp4"), None)
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn silent_upstream_is_500_not_request_timeout() {
    let (addr, calls) = start_stalled_upstream().await;
    let mut config = test_config();
    config.timeouts.request_secs = 1;
    config.proxy.response_timeout_secs = 1;
    let gateway = start_gateway(
        config,
        fake_providers(FakeMetadata::default(), FakeManifests::default()),
    )
    .await;

    let started = std::time::Instant::now();
    let res = gateway
        .sdk()
        .proxy(&format!("http://{addr}/v.mp4"), Some("bytes=0-99"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        res.headers()["access-control-expose-headers"],
        "Content-Length, Content-Range, Content-Type, Accept-Ranges"
    );
    assert!(res.bytes().await.unwrap().is_empty());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn relay_outlives_json_route_deadline() {
    let upstream = start_mock_upstream(|_| {
        MockResponse::trickle(200, vec![3u8; 512], 15, Duration::from_millis(100))
            .header("Content-Type", "video/mp4")
    })
    .await;
    let mut config = test_config();
    config.timeouts.request_secs = 1;
    let gateway = start_gateway(
        config,
        fake_providers(FakeMetadata::default(), FakeManifests::default()),
    )
    .await;

    let res = gateway.sdk().proxy(&upstream.url("/long.mp4"), None).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.bytes().await.unwrap();
    assert_eq!(body.len(), 15 * 512);
}

#[tokio::test]
async fn proxy_alias_route() {
    let upstream = start_media_upstream().await;
    let gateway = start_proxy_gateway().await;

    let res = http_client()
        .get(gateway.url("/proxy"))
        .query(&[("url", upstream.url("/v.mp4"))])
        .header("Range", "bytes=0-3")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.bytes().await.unwrap().to_vec(), vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn cors_headers_on_success_error_and_preflight() {
    let upstream = start_media_upstream().await;
    let gateway = start_proxy_gateway().await;
    let client = http_client();

    let ok = gateway.sdk().proxy(&upstream.url("/v.mp4"), None).await.unwrap();
    let bad = client.get(gateway.url("/api/video-proxy")).send().await.unwrap();
    let preflight = client
        .request(reqwest::Method::OPTIONS, gateway.url("/api/video-proxy"))
        .send()
        .await
        .unwrap();
    assert_eq!(preflight.status(), StatusCode::OK);

    for res in [&ok, &bad, &preflight] {
        let headers = res.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET, OPTIONS");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type, Range");
        assert_eq!(
            headers["access-control-expose-headers"],
            "Content-Length, Content-Range, Content-Type, Accept-Ranges"
        );
        assert!(headers.get("x-request-id").is_some());
    }
}

#[tokio::test]
async fn client_disconnect_closes_upstream() {
    let upstream = start_mock_upstream(|_| {
        MockResponse::trickle(200, vec![7u8; 16 * 1024], 10_000, Duration::from_millis(5))
            .header("Content-Type", "video/mp4")
    })
    .await;
    let gateway = start_proxy_gateway().await;

    let mut res = gateway.sdk().proxy(&upstream.url("/long.mp4"), None).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first = res.chunk().await.unwrap().unwrap();
    assert!(!first.is_empty());
    drop(res);

    assert!(
        eventually(Duration::from_secs(5), || upstream.saw_disconnect()).await,
        "upstream kept streaming after the client left"
    );
    assert!(upstream.chunks_written() < 10_000);
}

#[tokio::test]
async fn shutdown_ends_inflight_relays() {
    let upstream = start_mock_upstream(|_| {
        MockResponse::trickle(200, vec![1u8; 1024], 100_000, Duration::from_millis(10))
    })
    .await;
    let gateway = start_proxy_gateway().await;

    let mut res = gateway.sdk().proxy(&upstream.url("/live"), None).await.unwrap();
    assert!(res.chunk().await.unwrap().is_some());

    gateway.shutdown.trigger();

    // The body must end (cleanly or with an error) instead of running on.
    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while let Ok(Some(_)) = res.chunk().await {}
    })
    .await;
    assert!(drained.is_ok(), "relay survived shutdown");

    let stopped = tokio::time::timeout(Duration::from_secs(5), gateway.handle).await;
    assert!(stopped.is_ok(), "server did not stop");
}
