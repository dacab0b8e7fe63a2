//! HTTP transport against a local one-shot server.

#![cfg(feature = "http")]

use std::time::Duration;
use submit_throttle::{
    Description, Document, DocumentClient, HttpTransport, HttpTransportConfig, Product, Transport,
    TransportError,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A request as seen by the server: lowercased head and raw body.
struct Captured {
    head: String,
    body: Vec<u8>,
}

/// Serve `responses.len()` requests, answering each with the next status
/// line and body, and forward every request received.
async fn serve(responses: Vec<(&'static str, &'static str)>) -> (String, mpsc::UnboundedReceiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for (status, reply) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let captured = read_request(&mut socket).await;
            tx.send(captured).unwrap();

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                reply.len(),
                reply
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
    });

    (format!("http://{}/api/v3/lk/documents/create", addr), rx)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers were complete");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .map(|v| v.trim().parse::<usize>().unwrap())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before body was complete");
        buf.extend_from_slice(&chunk[..n]);
    }

    Captured {
        head,
        body: buf[head_end..head_end + content_length].to_vec(),
    }
}

fn transport(endpoint: String) -> HttpTransport {
    HttpTransport::with_config(HttpTransportConfig::new(endpoint).with_timeout(Duration::from_secs(5)))
        .unwrap()
}

fn sample_document() -> Document {
    Document {
        doc_id: Some("doc-1".to_string()),
        doc_type: Some("LP_INTRODUCE_GOODS".to_string()),
        description: Some(Description {
            participant_inn: Some("7700000000".to_string()),
        }),
        products: Some(vec![Product {
            uit_code: Some("uit-1".to_string()),
            ..Product::default()
        }]),
        ..Document::default()
    }
}

#[tokio::test]
async fn test_posts_json_with_authorization() {
    let (endpoint, mut requests) = serve(vec![("200 OK", "{}")]).await;
    let transport = transport(endpoint);

    transport
        .send(&sample_document(), "Bearer sign-123")
        .await
        .expect("delivery failed");

    let request = requests.recv().await.unwrap();
    assert!(request.head.starts_with("post /api/v3/lk/documents/create "));
    assert!(request.head.contains("authorization: bearer sign-123"));
    assert!(request.head.contains("content-type: application/json"));

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["doc_id"], "doc-1");
    assert_eq!(body["description"]["participantInn"], "7700000000");
    assert_eq!(body["importRequest"], false);
    assert_eq!(body["products"][0]["uit_code"], "uit-1");
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let (endpoint, _requests) = serve(vec![("500 Internal Server Error", "boom")]).await;
    let transport = transport(endpoint);

    let result = transport.send(&sample_document(), "sign").await;
    match result {
        Err(TransportError::Status { code, body }) => {
            assert_eq!(code, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_document_client_end_to_end() {
    let (endpoint, mut requests) = serve(vec![("200 OK", ""), ("200 OK", "")]).await;

    let client = DocumentClient::builder(Duration::from_millis(200), 1, transport(endpoint))
        .build()
        .unwrap();

    client.create_document(sample_document(), "sign-a");
    client.create_document(Document::default(), "sign-b");
    assert_eq!(client.pending(), 1);

    let first = tokio::time::timeout(Duration::from_secs(2), requests.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(first.head.contains("authorization: sign-a"));

    let second = tokio::time::timeout(Duration::from_secs(2), requests.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(second.head.contains("authorization: sign-b"));
    let body: serde_json::Value = serde_json::from_slice(&second.body).unwrap();
    assert!(body["products"].is_null());

    assert_eq!(client.metrics().admitted(), 2);
    assert_eq!(client.metrics().retries_dispatched(), 1);
    client.shutdown().await.unwrap();
}
