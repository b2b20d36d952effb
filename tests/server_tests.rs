//! End-to-end tests over a real TCP listener

use std::time::Duration;

use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use call_monitor::service::methods;
use call_monitor::{
    server, AccessController, Admin, Biz, CallContext, ServiceConfig, StartupError,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn test_config(addr: &str) -> ServiceConfig {
    let acl = AccessController::from_json(
        r#"{
            "alice": ["/main.Biz/Check"],
            "logger": ["/main.Admin/Logging"]
        }"#,
    )
    .unwrap();
    ServiceConfig::new(addr, acl)
}

async fn request(addr: std::net::SocketAddr, head: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(head.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    timeout(TIMEOUT, stream.read_to_end(&mut buf))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}

#[tokio::test]
async fn test_start_and_stop() {
    let shutdown = CancellationToken::new();
    let handle = server::start(test_config("127.0.0.1:0"), shutdown.clone())
        .await
        .unwrap();
    assert_ne!(handle.local_addr().port(), 0);

    let response = request(
        handle.local_addr(),
        "GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"));

    shutdown.cancel();
    timeout(TIMEOUT, handle.wait()).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_bind_conflict_is_reported() {
    let shutdown = CancellationToken::new();
    let first = server::start(test_config("127.0.0.1:0"), shutdown.clone())
        .await
        .unwrap();

    let taken = first.local_addr().to_string();
    let result = server::start(test_config(&taken), CancellationToken::new()).await;
    assert!(matches!(result, Err(StartupError::Bind { .. })));

    shutdown.cancel();
    timeout(TIMEOUT, first.wait()).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_check_over_http_records_peer_host() {
    let shutdown = CancellationToken::new();
    let handle = server::start(test_config("127.0.0.1:0"), shutdown.clone())
        .await
        .unwrap();
    let service = handle.service().clone();
    let mut feed = service.logging(&CallContext::for_consumer("logger")).unwrap();

    let response = request(
        handle.local_addr(),
        "POST /main.Biz/Check HTTP/1.1\r\nHost: localhost\r\nconsumer: alice\r\n\
         Content-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains(r#"{"dummy":true}"#));
    assert_eq!(service.snapshot().by_consumer["alice"], 1);

    let event = timeout(TIMEOUT, feed.next()).await.unwrap().unwrap();
    assert_eq!(event.consumer, "alice");
    assert!(event.host.starts_with("127.0.0.1:"), "host was {}", event.host);

    let response = request(
        handle.local_addr(),
        "POST /main.Biz/Check HTTP/1.1\r\nHost: localhost\r\n\
         Content-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 401"));

    shutdown.cancel();
    timeout(TIMEOUT, handle.wait()).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_logging_over_sse() {
    let shutdown = CancellationToken::new();
    let handle = server::start(test_config("127.0.0.1:0"), shutdown.clone())
        .await
        .unwrap();
    let service = handle.service().clone();

    let mut stream = TcpStream::connect(handle.local_addr()).await.unwrap();
    let request = "GET /main.Admin/Logging HTTP/1.1\r\nHost: localhost\r\nconsumer: logger\r\n\r\n";
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut received = String::new();
    let mut buf = [0u8; 4096];
    while !received.contains("\r\n\r\n") {
        let n = timeout(TIMEOUT, stream.read(&mut buf)).await.unwrap().unwrap();
        assert!(n > 0, "connection closed early");
        received.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    assert!(received.starts_with("HTTP/1.1 200"));
    assert!(received.contains("text/event-stream"));
    assert_eq!(service.subscriber_count(), 1);

    service.check(&CallContext::for_consumer("alice")).unwrap();

    while !received.contains(methods::CHECK) {
        let n = timeout(TIMEOUT, stream.read(&mut buf)).await.unwrap().unwrap();
        assert!(n > 0, "connection closed early");
        received.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    assert!(received.contains("event:"));
    assert!(received.contains(r#""consumer":"alice""#));

    shutdown.cancel();
    timeout(TIMEOUT, handle.wait()).await.unwrap().unwrap();
    assert_eq!(service.subscriber_count(), 0);
}
