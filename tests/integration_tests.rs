// Integration tests: HTTP and WebSocket endpoints

mod common;

use axum_test::TestServer;
use common::{device, port, snapshot};
use portpulse::models::{DeviceSeries, encode_payload};
use portpulse::publisher::Publisher;
use portpulse::routes;
use portpulse::store::SeriesStore;

fn test_app() -> (axum::Router, Publisher) {
    let publisher = Publisher::new(8);
    (routes::app(publisher.clone()), publisher)
}

/// Build TestServer with http_transport (required for WebSocket tests).
fn test_server_with_http() -> (TestServer, Publisher) {
    let (app, publisher) = test_app();
    let server = TestServer::builder().http_transport().build(app);
    (server, publisher)
}

fn rendered_payload(cycles: u64) -> String {
    let mut store = SeriesStore::new();
    for i in 1..=cycles {
        store
            .ingest_snapshot(
                &snapshot(vec![device("d1", vec![port("1", i * 10, i * 100)])]),
                format!("10:00:0{}", i),
            )
            .unwrap();
    }
    encode_payload(&store.render()).unwrap()
}

#[tokio::test]
async fn test_root_endpoint() {
    let (app, _) = test_app();
    let server = TestServer::new(app);
    let response = server.get("/").await;
    response.assert_status_ok();
    response.assert_text("portpulse: port statistics relay");
}

#[tokio::test]
async fn test_version_endpoint() {
    let (app, _) = test_app();
    let server = TestServer::new(app);
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(
        json.get("name").and_then(|v| v.as_str()),
        Some("portpulse")
    );
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_statistics_endpoint_empty_before_first_cycle() {
    let (app, _) = test_app();
    let server = TestServer::new(app);
    let response = server.get("/api/statistics").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_statistics_endpoint_serves_latest_payload() {
    let (app, publisher) = test_app();
    let server = TestServer::new(app);
    publisher.publish(rendered_payload(1));
    publisher.publish(rendered_payload(2));

    let response = server.get("/api/statistics").await;
    response.assert_status_ok();
    let devices: Vec<DeviceSeries> = response.json();
    assert_eq!(devices[0].ports[0].packets_sent, vec![10, 20]);
    assert_eq!(devices[0].ports[0].bytes_sent, vec![100, 200]);
}

#[tokio::test]
async fn test_published_wire_format_field_names() {
    let (app, publisher) = test_app();
    let server = TestServer::new(app);
    publisher.publish(rendered_payload(1));

    let json: serde_json::Value = server.get("/api/statistics").await.json();
    let port = &json[0]["ports"][0];
    assert_eq!(json[0]["id"], "d1");
    assert_eq!(port["id"], "1");
    for field in [
        "timestamps",
        "packetsSent",
        "packetsReceived",
        "bytesSent",
        "bytesReceived",
        "packetsRxDropped",
        "packetsTxDropped",
        "packetsRxErrors",
        "packetsTxErrors",
    ] {
        assert!(port[field].is_array(), "missing {}", field);
    }
}

// --- WebSocket message tests (require http_transport + ws feature) ---
// Receive until we get valid JSON (server may send Ping first).

async fn receive_first_json_text<T: serde::de::DeserializeOwned>(
    ws: &mut axum_test::TestWebSocket,
) -> T {
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(3);
    loop {
        let text = ws.receive_text().await;
        if let Ok(v) = serde_json::from_str::<T>(&text) {
            return v;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for JSON"
        );
    }
}

#[tokio::test]
async fn test_ws_receives_latest_payload_on_connect() {
    let (server, publisher) = test_server_with_http();
    publisher.publish(rendered_payload(2));

    let mut ws = server.get_websocket("/ws").await.into_websocket().await;
    let devices: Vec<DeviceSeries> = receive_first_json_text(&mut ws).await;
    assert_eq!(devices[0].id, "d1");
    assert_eq!(devices[0].ports[0].packets_sent, vec![10, 20]);
    assert_eq!(devices[0].ports[0].timestamps.len(), 2);
}

#[tokio::test]
async fn test_ws_receives_broadcast_payload() {
    let (server, publisher) = test_server_with_http();
    let mut ws = server.get_websocket("/ws").await.into_websocket().await;

    let publisher_clone = publisher.clone();
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        publisher_clone.publish(rendered_payload(3));
    });
    let devices: Vec<DeviceSeries> = receive_first_json_text(&mut ws).await;
    assert_eq!(devices[0].ports[0].packets_sent, vec![10, 20, 30]);
}

#[tokio::test]
async fn test_ws_subscriber_count_tracks_connections() {
    let (server, publisher) = test_server_with_http();
    publisher.publish(rendered_payload(1));
    let mut ws = server.get_websocket("/ws").await.into_websocket().await;
    let _: Vec<DeviceSeries> = receive_first_json_text(&mut ws).await;
    assert_eq!(publisher.subscriber_count(), 1);
}

#[tokio::test]
async fn test_ws_on_root_path_receives_latest_payload() {
    let (server, publisher) = test_server_with_http();
    publisher.publish(rendered_payload(2));

    let mut ws = server.get_websocket("/").await.into_websocket().await;
    let devices: Vec<DeviceSeries> = receive_first_json_text(&mut ws).await;
    assert_eq!(devices[0].id, "d1");
    assert_eq!(devices[0].ports[0].packets_sent, vec![10, 20]);
}

#[tokio::test]
async fn test_root_banner_still_served_over_http_transport() {
    let (server, _) = test_server_with_http();
    let response = server.get("/").await;
    response.assert_status_ok();
    response.assert_text("portpulse: port statistics relay");
}

async fn wait_for_subscribers(publisher: &Publisher, expected: usize) {
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(3);
    while publisher.subscriber_count() != expected {
        assert!(
            tokio::time::Instant::now() < deadline,
            "subscriber count stuck at {}, expected {}",
            publisher.subscriber_count(),
            expected
        );
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_ws_closed_subscriber_does_not_stop_others() {
    let (server, publisher) = test_server_with_http();
    publisher.publish(rendered_payload(1));

    let mut leaving = server.get_websocket("/").await.into_websocket().await;
    let mut staying = server.get_websocket("/ws").await.into_websocket().await;
    let _: Vec<DeviceSeries> = receive_first_json_text(&mut leaving).await;
    let _: Vec<DeviceSeries> = receive_first_json_text(&mut staying).await;
    assert_eq!(publisher.subscriber_count(), 2);

    leaving.close().await;
    wait_for_subscribers(&publisher, 1).await;

    assert_eq!(publisher.publish(rendered_payload(2)), 1);
    let devices: Vec<DeviceSeries> = receive_first_json_text(&mut staying).await;
    assert_eq!(devices[0].ports[0].packets_sent, vec![10, 20]);

    assert_eq!(publisher.publish(rendered_payload(3)), 1);
    let devices: Vec<DeviceSeries> = receive_first_json_text(&mut staying).await;
    assert_eq!(devices[0].ports[0].packets_sent, vec![10, 20, 30]);
    assert_eq!(publisher.subscriber_count(), 1);
}
