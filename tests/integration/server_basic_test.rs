// Integration tests: record through the proxy, then replay from disk

use super::test_harness::{client, ProxyTestHarness, TestOrigin, INDEX_BODY, JSON_BODY};
use restcache::cache::Layout;

#[tokio::test]
async fn test_miss_fetches_then_hit_replays() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;
    let client = client();

    let first = client.get(proxy.url("/index.html")).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 200);
    assert_eq!(first.headers()["content-type"], "text/html");
    assert_eq!(first.text().await.unwrap(), INDEX_BODY);

    let second = client.get(proxy.url("/index.html")).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 200);
    assert_eq!(second.headers()["content-type"], "text/html");
    assert_eq!(second.text().await.unwrap(), INDEX_BODY);

    assert_eq!(origin.hits("/index.html"), 1, "Second request must be a cache hit");
    assert!(proxy.cache_dir.path().join("index.html").is_file());
    assert_eq!(proxy.metrics.stores(Layout::Simple), 1);
}

#[tokio::test]
async fn test_non_default_status_round_trips() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;
    let client = client();

    for _ in 0..2 {
        let response = client.get(proxy.url("/api/data")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 201);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.text().await.unwrap(), JSON_BODY);
    }

    assert_eq!(origin.hits("/api/data"), 1);
    let entry = proxy.cache_dir.path().join("api").join("data");
    assert!(entry.join(".dmp").is_file());
    assert!(entry.join(".prp").is_file());
}

#[tokio::test]
async fn test_origin_404_is_cached_too() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;
    let client = client();

    for _ in 0..2 {
        let response = client.get(proxy.url("/gone")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 404);
        assert_eq!(response.text().await.unwrap(), "no such thing");
    }
    assert_eq!(origin.hits("/gone"), 1);
}

#[tokio::test]
async fn test_query_order_shares_one_entry() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;
    let client = client();

    let first = client
        .get(proxy.url("/search?q=rust+lang&page=2"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let second = client
        .get(proxy.url("/search?page=2&q=rust%20lang"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // The origin echoes the canonical target it was asked for
    assert_eq!(first, "/search?page=2&q=rust%20lang");
    assert_eq!(second, first);
    assert_eq!(origin.total_hits(), 1);
}

#[tokio::test]
async fn test_head_has_no_body() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;

    let response = client().head(proxy.url("/index.html")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["content-type"], "text/html");
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_other_methods_rejected() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;

    let response = client()
        .post(proxy.url("/index.html"))
        .body("payload")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 405);
    assert_eq!(response.headers()["allow"], "GET, HEAD");
    assert_eq!(origin.total_hits(), 0);
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    // Reserve a port, then free it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = listener.local_addr().unwrap().to_string();
    drop(listener);

    let proxy = ProxyTestHarness::start(Some(dead)).await;
    let response = client().get(proxy.url("/index.html")).send().await.unwrap();

    assert_eq!(response.status().as_u16(), 502);
    assert!(!proxy.cache_dir.path().join("index.html").exists());
}
