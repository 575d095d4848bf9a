use std::time::{Duration, Instant};

use diskio_sim_lib::{sim::ReadStatus, wire::ReadResponse};

use crate::test::e2e;

#[tokio::test]
#[tracing_test::traced_test]
async fn test_zero_override_succeeds_immediately() {
    let runtime = e2e::runtime::get().await;

    let start = Instant::now();
    let resp = runtime.request("0,readme.txt").await;

    assert_eq!(resp.status, ReadStatus::Success);
    assert_eq!(resp.file_path, "readme.txt");
    assert!(resp.bytes_read < 100_000);
    assert!(resp.total_elapsed_ms < 1000, "{resp:?}");
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_override_sets_service_time() {
    let runtime = e2e::runtime::get().await;

    let start = Instant::now();
    let resp = runtime.request("250,data/a.bin").await;

    assert!(start.elapsed() >= Duration::from_millis(250));
    assert_eq!(resp.status, ReadStatus::Success);
    assert_eq!(resp.file_path, "data/a.bin");
    assert!(resp.total_elapsed_ms >= 250, "{resp:?}");
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_override_above_timeout_is_reported_as_read_timeout() {
    let runtime = e2e::runtime::get().await;

    let resp = runtime.request("4100,late.bin").await;

    assert_eq!(resp.status, ReadStatus::ReadTimeout);
    assert_eq!(resp.bytes_read, 0);
    assert!(resp.total_elapsed_ms >= 4100, "{resp:?}");
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_response_has_no_trailing_newline() {
    let runtime = e2e::runtime::get().await;

    let raw = runtime.send_raw(b"0,x.txt\n").await;
    assert!(raw.ends_with(",x.txt"), "{raw:?}");
    assert!(!raw.ends_with('\n'));
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_file_path_with_delimiters_is_echoed() {
    let runtime = e2e::runtime::get().await;

    let resp = runtime.request("0,dir/a,b,c.txt").await;
    assert_eq!(resp.status, ReadStatus::Success);
    assert_eq!(resp.file_path, "dir/a,b,c.txt");
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_closed_without_request_gets_no_response() {
    let runtime = e2e::runtime::get().await;

    let raw = runtime.send_raw(b"").await;
    assert!(raw.is_empty(), "{raw:?}");
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_concurrent_requests_are_all_answered() {
    let runtime = e2e::runtime::get().await;

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let runtime = runtime.clone();
            tokio::spawn(async move { runtime.request(&format!("100,file-{i}.txt")).await })
        })
        .collect();

    let start = Instant::now();
    for (i, handle) in handles.into_iter().enumerate() {
        let resp: ReadResponse = handle.await.unwrap();
        assert_eq!(resp.status, ReadStatus::Success);
        assert_eq!(resp.file_path, format!("file-{i}.txt"));
    }
    // reads overlap, they are not served one after the other
    assert!(start.elapsed() < Duration::from_secs(3));
}
