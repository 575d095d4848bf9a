#![allow(unused)]

mod runtime;

mod test_http;
mod test_requests;

#[tokio::test]
#[tracing_test::traced_test]
async fn test_runtime_get() {
    let runtime = self::runtime::get().await;
    assert!(runtime.server_addr().ip().is_loopback());
    assert_ne!(runtime.server_addr().port(), 0);
    assert_ne!(runtime.http_server_addr().port(), 0);
    assert_ne!(runtime.http_server_addr(), runtime.server_addr());
}
