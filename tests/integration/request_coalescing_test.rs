// Request Coalescing Integration Tests
//
// Concurrent first requests for one key must reach the backend once

use super::test_harness::{client, ProxyTestHarness, TestOrigin, INDEX_BODY};

#[tokio::test]
async fn test_concurrent_misses_fetch_once() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;
    let client = client();

    let mut handles = vec![];
    for _ in 0..10 {
        let client = client.clone();
        let url = proxy.url("/slow.html");
        handles.push(tokio::spawn(async move {
            let response = client.get(url).send().await.unwrap();
            (response.status().as_u16(), response.text().await.unwrap())
        }));
    }

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(body, INDEX_BODY);
    }

    assert_eq!(origin.hits("/slow.html"), 1, "Only one backend fetch expected");
    assert_eq!(proxy.metrics.backend_fetches.get(), 1);
}

#[tokio::test]
async fn test_different_keys_fetch_independently() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;
    let client = client();

    let (a, b) = tokio::join!(
        client.get(proxy.url("/slow.html?v=1")).send(),
        client.get(proxy.url("/slow.html?v=2")).send(),
    );
    assert_eq!(a.unwrap().status().as_u16(), 200);
    assert_eq!(b.unwrap().status().as_u16(), 200);

    assert_eq!(origin.hits("/slow.html?v=1"), 1);
    assert_eq!(origin.hits("/slow.html?v=2"), 1);
}
