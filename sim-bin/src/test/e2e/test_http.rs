use crate::{server::HTTP_SERVER_NAME, test::e2e};

fn split_response(raw: &str) -> (&str, &str) {
    raw.split_once("\r\n\r\n")
        .unwrap_or_else(|| panic!("invalid http response: {raw:?}"))
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_http_read_is_ok() {
    let runtime = e2e::runtime::get().await;

    let raw = runtime.http_get("/200,0,readme.txt").await;
    let (head, body) = split_response(&raw);

    assert!(head.starts_with("HTTP/1.1 200"), "{head}");
    let head = head.to_ascii_lowercase();
    assert!(head.contains(&format!("server: {HTTP_SERVER_NAME}")), "{head}");
    assert!(head.contains("connection: close"), "{head}");
    assert!(
        head.contains(&format!("content-length: {}", body.len())),
        "{head}"
    );

    let (total_ms, file_path) = body.split_once(',').unwrap();
    assert!(total_ms.parse::<u64>().unwrap() < 1000, "{body}");
    assert_eq!(file_path, "readme.txt");
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_http_malformed_request_is_bad_request() {
    let runtime = e2e::runtime::get().await;

    let raw = runtime.http_get("/200,readme.txt").await;
    let (head, body) = split_response(&raw);

    assert!(head.starts_with("HTTP/1.1 400"), "{head}");
    assert!(body.ends_with(','), "{body}");
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_http_read_above_timeout_is_request_timeout() {
    let runtime = e2e::runtime::get().await;

    let raw = runtime.http_get("/200,4100,late.bin").await;
    let (head, body) = split_response(&raw);

    assert!(head.starts_with("HTTP/1.1 408"), "{head}");
    assert!(body.ends_with(",late.bin"), "{body}");
}
