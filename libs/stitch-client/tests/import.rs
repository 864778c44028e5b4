use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use stitch_api::{build_message_batches, package, BatchLimits, ErrorKind, FieldTrait, IngestError};
use stitch_client::{ClientConfig, ImportClient};

/// Captured request: head (request line + headers) and body.
struct Captured {
    head: String,
    body: Vec<u8>,
}

/// Read one HTTP/1.1 request from the socket.
async fn read_request(sock: &mut tokio::net::TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = sock.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let len: usize = head
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse().unwrap())
        })
        .unwrap_or(0);
    while buf.len() < head_end + len {
        let n = sock.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before body");
        buf.extend_from_slice(&chunk[..n]);
    }
    Captured { head, body: buf[head_end..head_end + len].to_vec() }
}

/// Serve `responses.len()` requests on sequential connections, one canned
/// response each.
async fn stub(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Captured>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let mut captured = Vec::new();
        for (status, body) in responses {
            let (mut sock, _) = listener.accept().await.unwrap();
            captured.push(read_request(&mut sock).await);
            let resp = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
        }
        captured
    });
    (base, handle)
}

fn payloads(input: &[u8], limits: BatchLimits) -> Vec<stitch_api::BatchPayload> {
    let batches = build_message_batches(input, 1234, limits).unwrap();
    let schema = stitch_api::build_schema(&[FieldTrait::new("item", "string")]);
    package(batches, "test", &schema, &["item".to_string()])
}

#[tokio::test]
async fn send_posts_batch_with_auth() {
    let (base, server) = stub(vec![(201, r#"{"status":"OK","message":"Batch accepted"}"#)]).await;
    let client = ImportClient::new(ClientConfig::new("secret").with_base_url(base)).unwrap();

    let batch = payloads(br#"[{"item":"a"},{"item":"b"}]"#, BatchLimits::default());
    let receipt = client.send(&batch[0]).await.unwrap();

    assert_eq!(receipt.status, 201);
    assert_eq!(receipt.body["status"], "OK");
    assert_eq!(receipt.body["message"], "Batch accepted");

    let req = &server.await.unwrap()[0];
    let head = req.head.to_ascii_lowercase();
    assert!(head.starts_with("post /v2/import/batch http/1.1"));
    assert!(head.contains("authorization: bearer secret"));
    assert!(head.contains("content-type: application/json"));

    let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
    assert_eq!(body["table_name"], "test");
    assert_eq!(body["key_names"][0], "item");
    assert_eq!(body["messages"][1]["data"]["item"], "b");
    assert_eq!(body["messages"][0]["sequence"], 1234);
    assert_eq!(body["messages"][0]["action"], "upsert");
}

#[tokio::test]
async fn non_success_is_rejected() {
    let (base, server) = stub(vec![(400, r#"{"error":"bad schema"}"#)]).await;
    let client = ImportClient::new(ClientConfig::new("t").with_base_url(base)).unwrap();

    let batch = payloads(br#"[{"item":"a"}]"#, BatchLimits::default());
    let err = client.send(&batch[0]).await.unwrap_err();

    match &err {
        IngestError::Rejected { status, body } => {
            assert_eq!(*status, 400);
            assert!(body.contains("bad schema"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::Io);
    server.await.unwrap();
}

#[tokio::test]
async fn unparsable_body_gives_empty_map() {
    let (base, server) = stub(vec![(202, "accepted")]).await;
    let client = ImportClient::new(ClientConfig::new("t").with_base_url(base)).unwrap();

    let batch = payloads(br#"[{"item":"a"}]"#, BatchLimits::default());
    let receipt = client.send(&batch[0]).await.unwrap();
    assert_eq!(receipt.status, 202);
    assert!(receipt.body.is_empty());
    server.await.unwrap();
}

#[tokio::test]
async fn send_all_in_order_and_stops_on_failure() {
    let (base, server) = stub(vec![(201, "{}"), (500, "boom")]).await;
    let client = ImportClient::new(ClientConfig::new("t").with_base_url(base)).unwrap();

    // count ceiling 1 → three single-record batches; the third is never sent
    let batches = payloads(br#"[{"item":"a"},{"item":"b"},{"item":"c"}]"#, BatchLimits::new(1_000, 1));
    assert_eq!(batches.len(), 3);

    let err = client.send_all(&batches).await.unwrap_err();
    assert!(matches!(err, IngestError::Rejected { status: 500, .. }));

    let reqs = server.await.unwrap();
    assert_eq!(reqs.len(), 2);
    let items: Vec<String> = reqs
        .iter()
        .map(|r| {
            let v: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            v["messages"][0]["data"]["item"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(items, ["a", "b"]);
}

#[tokio::test]
async fn timeout_is_io_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        let (sock, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        drop(sock);
    });

    let client = ImportClient::new(
        ClientConfig::new("t").with_base_url(base).with_timeout(Duration::from_millis(200)),
    )
    .unwrap();
    let batch = payloads(br#"[{"item":"a"}]"#, BatchLimits::default());
    let err = client.send(&batch[0]).await.unwrap_err();
    assert!(matches!(err, IngestError::Io(_)));
    server.abort();
}
