// tests/channel_ws.rs

//! End-to-end delivery over a real WebSocket listener.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message;

use sfu_samples_ws::SampleChannelBuilder;

#[derive(Debug, Serialize)]
struct SampleRecord {
    a: i32,
}

/// Local collector stand-in: accepts one WebSocket connection, records the
/// request path, and forwards every binary frame it receives.
struct Collector {
    // ---
    port: u16,
    path: Arc<Mutex<String>>,
    frames: mpsc::Receiver<Vec<u8>>,
}

impl Collector {
    async fn start() -> Self {
        // ---
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let port = listener.local_addr().expect("local addr").port();

        let path = Arc::new(Mutex::new(String::new()));
        let (frame_tx, frames) = mpsc::channel(16);

        let seen_path = path.clone();
        tokio::spawn(async move {
            // ---
            let (stream, _) = listener.accept().await.expect("accept");

            let capture = |req: &Request, resp: Response| {
                *seen_path.lock().unwrap() = req.uri().path().to_string();
                Ok(resp)
            };

            let mut ws = accept_hdr_async(stream, capture)
                .await
                .expect("websocket handshake");

            while let Some(Ok(message)) = ws.next().await {
                if let Message::Binary(data) = message {
                    if frame_tx.send(data).await.is_err() {
                        break;
                    }
                }
            }
        });

        Self { port, path, frames }
    }
}

#[tokio::test]
async fn sent_sample_arrives_as_one_frame_at_the_derived_target() {
    // ---
    // Arrange
    // ---
    let mut collector = Collector::start().await;

    let channel = SampleChannelBuilder::new()
        .host("127.0.0.1")
        .port(collector.port)
        .insecure()
        .service_id("svc")
        .media_unit_id("mu1")
        .build()
        .expect("channel build failed");

    let connected = Arc::new(std::sync::atomic::AtomicBool::new(false));
    {
        let connected = connected.clone();
        channel.on_connected(move || {
            connected.store(true, std::sync::atomic::Ordering::SeqCst);
        });
    }

    let payload = serde_json::to_vec(&SampleRecord { a: 1 }).unwrap();

    // ---
    // Act
    // ---
    channel.send(payload.clone()).await.expect("send failed");

    // ---
    // Assert
    // ---
    let frame = timeout(Duration::from_secs(5), collector.frames.recv())
        .await
        .expect("timed out waiting for frame")
        .expect("collector connection closed unexpectedly");

    assert_eq!(frame, payload);
    assert_eq!(String::from_utf8(frame).unwrap(), r#"{"a":1}"#);

    assert!(connected.load(std::sync::atomic::Ordering::SeqCst));
    assert_eq!(*collector.path.lock().unwrap(), "/sfusamples/svc/mu1");

    channel.close().await;
}

#[tokio::test]
async fn frames_arrive_in_send_order() {
    // ---
    let mut collector = Collector::start().await;

    let channel = SampleChannelBuilder::new()
        .host("127.0.0.1")
        .port(collector.port)
        .insecure()
        .service_id("svc")
        .media_unit_id("mu1")
        .build()
        .unwrap();

    for i in 0..5 {
        let payload = serde_json::to_vec(&SampleRecord { a: i }).unwrap();
        channel.send(payload).await.unwrap();
    }

    for i in 0..5 {
        let frame = timeout(Duration::from_secs(5), collector.frames.recv())
            .await
            .expect("timed out waiting for frame")
            .expect("collector connection closed unexpectedly");

        let expected = serde_json::to_vec(&SampleRecord { a: i }).unwrap();
        assert_eq!(frame, expected);
    }

    channel.close().await;
}
