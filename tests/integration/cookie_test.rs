// Integration tests: cookie forwarding and Set-Cookie replay

use super::test_harness::{client, ProxyTestHarness, TestOrigin, SESSION_COOKIE, THEME_COOKIE};

#[tokio::test]
async fn test_cookies_forwarded_as_single_header() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;

    let response = client()
        .get(proxy.url("/index.html"))
        .header("cookie", "a=b; c=d")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    assert_eq!(origin.cookies(), vec![Some("a=b;c=d;".to_string())]);
}

#[tokio::test]
async fn test_no_cookie_header_without_cookies() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;

    client().get(proxy.url("/index.html")).send().await.unwrap();
    assert_eq!(origin.cookies(), vec![None]);
}

#[tokio::test]
async fn test_set_cookie_replayed_on_hit() {
    let origin = TestOrigin::start().await;
    let proxy = ProxyTestHarness::start(Some(origin.host())).await;
    let client = client();

    for _ in 0..2 {
        let response = client.get(proxy.url("/login.html")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let cookies: Vec<_> = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies, vec![SESSION_COOKIE.to_string(), THEME_COOKIE.to_string()]);
    }

    assert_eq!(origin.hits("/login.html"), 1);
    // Cookies force the extended layout even for a default-typed 200
    let entry = proxy.cache_dir.path().join("login.html");
    assert!(entry.is_dir());
    let meta = std::fs::read_to_string(entry.join(".prp")).unwrap();
    assert!(meta.contains("status=200"));
}
