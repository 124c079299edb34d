// Integration tests for the Prometheus metrics endpoint

use super::test_harness::{client, ProxyTestHarness, TestOrigin};

#[tokio::test]
async fn test_metrics_endpoint_reports_cache_activity() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;
    let client = client();

    client.get(proxy.url("/index.html")).send().await.unwrap();
    client.get(proxy.url("/index.html")).send().await.unwrap();
    client.get(proxy.url("/api/data")).send().await.unwrap();

    let response = client.get(proxy.url("/_metrics")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = response.text().await.unwrap();
    assert!(text.contains("restcache_requests_total{outcome=\"hit\"} 3"));
    assert!(text.contains("restcache_requests_total{outcome=\"miss\"} 2"));
    assert!(text.contains("restcache_backend_requests_total{result=\"sent\"} 2"));
    assert!(text.contains("restcache_cache_stores_total{layout=\"simple\"} 1"));
    assert!(text.contains("restcache_cache_stores_total{layout=\"extended\"} 1"));

    // The metrics path itself is never proxied
    assert_eq!(origin.hits("/_metrics"), 0);
}
