// Integration tests: serving a pre-populated cache without a backend

use super::test_harness::{client, ProxyTestHarness, TestOrigin, INDEX_BODY};

#[tokio::test]
async fn test_offline_miss_is_not_found() {
    let proxy = ProxyTestHarness::start(None).await;

    let response = client().get(proxy.url("/never/seen.html")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert!(response.bytes().await.unwrap().is_empty());

    let entries = std::fs::read_dir(proxy.cache_dir.path()).unwrap().count();
    assert_eq!(entries, 0, "Offline miss must not touch the cache");
    assert_eq!(proxy.metrics.not_found_offline.get(), 1);
}

#[tokio::test]
async fn test_recorded_cache_replays_offline() {
    let origin = TestOrigin::start().await;
    let recorder = ProxyTestHarness::start(Some(origin.host())).await;
    let client = client();

    for path in ["/index.html", "/api/data", "/login.html"] {
        let response = client.get(recorder.url(path)).send().await.unwrap();
        assert!(response.status().is_success());
    }
    let cache_dir = recorder.stop();
    drop(origin);

    let replayer = ProxyTestHarness::start_in(cache_dir, None).await;

    let index = client.get(replayer.url("/index.html")).send().await.unwrap();
    assert_eq!(index.status().as_u16(), 200);
    assert_eq!(index.text().await.unwrap(), INDEX_BODY);

    let data = client.get(replayer.url("/api/data")).send().await.unwrap();
    assert_eq!(data.status().as_u16(), 201);

    let login = client.get(replayer.url("/login.html")).send().await.unwrap();
    assert_eq!(login.headers().get_all("set-cookie").iter().count(), 2);

    let missing = client.get(replayer.url("/other.html")).send().await.unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn test_hand_written_entries_are_served() {
    let cache_dir = tempfile::TempDir::new().unwrap();
    std::fs::create_dir_all(cache_dir.path().join("static")).unwrap();
    std::fs::write(cache_dir.path().join("static").join("app.js"), "main();").unwrap();

    let entry = cache_dir.path().join("status");
    std::fs::create_dir_all(&entry).unwrap();
    std::fs::write(entry.join(".dmp"), "maintenance").unwrap();
    std::fs::write(
        entry.join(".prp"),
        "#written by hand\nstatus=503\nContent-Type=text/plain\n",
    )
    .unwrap();

    let proxy = ProxyTestHarness::start_in(cache_dir, None).await;
    let client = client();

    let script = client.get(proxy.url("/static/app.js")).send().await.unwrap();
    assert_eq!(script.status().as_u16(), 200);
    assert_eq!(script.headers()["content-type"], "text/javascript");
    assert_eq!(script.text().await.unwrap(), "main();");

    let status = client.get(proxy.url("/status")).send().await.unwrap();
    assert_eq!(status.status().as_u16(), 503);
    assert_eq!(status.headers()["content-type"], "text/plain");
    assert_eq!(status.text().await.unwrap(), "maintenance");
}

#[tokio::test]
async fn test_corrupt_entry_is_server_error() {
    let cache_dir = tempfile::TempDir::new().unwrap();
    let entry = cache_dir.path().join("half");
    std::fs::create_dir_all(&entry).unwrap();
    std::fs::write(entry.join(".dmp"), "body without metadata").unwrap();

    let proxy = ProxyTestHarness::start_in(cache_dir, None).await;
    let response = client().get(proxy.url("/half")).send().await.unwrap();

    assert_eq!(response.status().as_u16(), 500);
}
