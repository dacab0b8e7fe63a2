//! What the throttle logs, captured with a test layer.
//!
//! Each test installs a thread-local subscriber and runs on the
//! current-thread runtime, so spawned delivery tasks log into it too.

use std::time::Duration;
use submit_throttle::infrastructure::mocks::{MockCaptureLayer, RecordingTransport};
use submit_throttle::ThrottledClient;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

type TestClient = ThrottledClient<u32, RecordingTransport<u32>>;

fn capture() -> (MockCaptureLayer, tracing::subscriber::DefaultGuard) {
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

#[tokio::test]
async fn test_transport_failure_logged_as_warning() {
    let (capture, _guard) = capture();
    let transport = RecordingTransport::failing();
    let client = TestClient::builder(Duration::from_secs(1), 5, transport.clone())
        .build()
        .unwrap();

    client.submit(1, "sign");
    assert!(transport.wait_for(1, Duration::from_secs(1)).await);
    tokio::task::yield_now().await;

    let warnings = capture.at_level(Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("delivery failed"));
    assert!(warnings[0]
        .fields
        .get("error")
        .is_some_and(|e| e.contains("simulated failure")));
    assert_eq!(client.metrics().transport_failures(), 1);

    // Not retried
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.count(), 1);
    assert_eq!(client.pending(), 0);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_deferral_logged_with_wait() {
    let (capture, _guard) = capture();
    let client = TestClient::builder(Duration::from_secs(10), 1, RecordingTransport::new())
        .build()
        .unwrap();

    client.submit(1, "sign");
    client.submit(2, "sign");

    let deferred: Vec<_> = capture
        .at_level(Level::DEBUG)
        .into_iter()
        .filter(|e| e.message.contains("deferred"))
        .collect();
    assert_eq!(deferred.len(), 1);
    let wait_ms: u64 = deferred[0].fields["wait_ms"].parse().unwrap();
    assert!(wait_ms > 9_000 && wait_ms <= 10_000);
    assert_eq!(deferred[0].fields["pending"], "1");

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_lifecycle_logged() {
    let (capture, _guard) = capture();
    let client = TestClient::builder(Duration::from_secs(10), 1, RecordingTransport::new())
        .build()
        .unwrap();

    client.submit(1, "sign");
    client.submit(2, "sign");
    tokio::task::yield_now().await;
    client.shutdown().await.unwrap();

    assert!(capture.contains_message("retry dispatcher started"));
    assert!(capture.contains_message("retry dispatcher stopped"));

    let abandoned: Vec<_> = capture
        .at_level(Level::WARN)
        .into_iter()
        .filter(|e| e.fields.contains_key("abandoned"))
        .collect();
    assert_eq!(abandoned.len(), 1);
    assert_eq!(abandoned[0].fields["abandoned"], "1");
}

#[tokio::test]
async fn test_zero_limit_opt_in_warns_at_build() {
    let (capture, _guard) = capture();
    let client = TestClient::builder(Duration::from_secs(1), 0, RecordingTransport::new())
        .allow_zero_limit()
        .build()
        .unwrap();

    assert!(capture
        .at_level(Level::WARN)
        .iter()
        .any(|e| e.message.contains("request limit is zero")));

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_credentials_never_logged() {
    let (capture, _guard) = capture();
    let transport = RecordingTransport::failing();
    let client = TestClient::builder(Duration::from_millis(50), 1, transport.clone())
        .build()
        .unwrap();

    let secret = "secret-signature-4f1c";
    for i in 0..3 {
        client.submit(i, secret);
    }
    assert!(transport.wait_for(3, Duration::from_secs(2)).await);
    tokio::task::yield_now().await;
    client.shutdown().await.unwrap();

    assert!(capture.count() > 0);
    assert!(!capture.mentions(secret));
}
