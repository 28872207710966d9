use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Path;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use trackit_poller::config::PollerConfig;
use trackit_poller::error::FetchErrorKind;
use trackit_poller::shipment::{Location, ShipmentStatus};
use trackit_poller::source::http_source::HttpShipmentSource;
use trackit_poller::source::traits::ShipmentSource;

/// Fake tracking API keyed on the requested id.
async fn track(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "MISSING" => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "not found"})),
        )
            .into_response(),
        "BUSY" => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"detail": "429 Too Many Requests"})),
        )
            .into_response(),
        "TEAPOT" => (StatusCode::IM_A_TEAPOT, "short and stout").into_response(),
        "BROKEN" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "normalization failed"})),
        )
            .into_response(),
        "GATEWAY" => (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response(),
        "HTML" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html")],
            "<html>maintenance</html>",
        )
            .into_response(),
        "SLOW" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"tracking_id": "SLOW", "normalized_status": "IN_TRANSIT"})).into_response()
        }
        _ => Json(json!({
            "tracking_id": id,
            "normalized_status": "IN_TRANSIT",
            "friendly_status": "In Transit",
            "carrier_name": "Carrier A",
            "last_update": 1718000000.0,
            "current_location": {"latitude": 34.5, "longitude": -92.25},
            "origin": "Medellin",
            "destination": "Bogota"
        }))
        .into_response(),
    }
}

/// Echoes the API key header back as the carrier so tests can see it arrived.
async fn track_keyed(Path(id): Path<String>, headers: HeaderMap) -> Response {
    let key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();
    Json(json!({"tracking_id": id, "normalized_status": "DELIVERED", "carrier_name": key}))
        .into_response()
}

async fn start_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/api/v1/track/{id}", get(track))
        .route("/keyed/api/v1/track/{id}", get(track_keyed));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

fn source_for(addr: SocketAddr) -> HttpShipmentSource {
    let mut config = PollerConfig::new(format!("http://{}", addr));
    config.request_timeout_ms = 300;
    HttpShipmentSource::new(&config).unwrap()
}

#[tokio::test]
async fn test_fetch_success() {
    let (addr, _handle) = start_server().await;
    let source = source_for(addr);

    let snap = source.fetch("TRACK0002").await.unwrap();
    assert_eq!(snap.tracking_id, "TRACK0002");
    assert_eq!(snap.normalized_status, ShipmentStatus::InTransit);
    assert_eq!(snap.friendly_status, "In Transit");
    assert_eq!(snap.carrier_name.as_deref(), Some("Carrier A"));
    assert_eq!(snap.last_update, Some(1718000000.0));
    assert_eq!(snap.location, Location::new(34.5, -92.25));
    assert_eq!(snap.origin.as_deref(), Some("Medellin"));
    assert_eq!(snap.destination.as_deref(), Some("Bogota"));
}

#[tokio::test]
async fn test_fetch_escapes_tracking_id() {
    let (addr, _handle) = start_server().await;
    let source = source_for(addr);

    let snap = source.fetch("AB/12 X").await.unwrap();
    assert_eq!(snap.tracking_id, "AB/12 X");
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    let (addr, _handle) = start_server().await;
    let source = source_for(addr);

    let err = source.fetch("MISSING").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::NotFound);
    assert_eq!(err.message, "not found");
    assert_eq!(err.status, Some(404));

    let err = source.fetch("BUSY").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::RateLimited);
    assert_eq!(err.message, "429 Too Many Requests");

    let err = source.fetch("TEAPOT").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::ClientError);
    assert!(err.message.contains("418"));

    let err = source.fetch("BROKEN").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::ServerError);
    assert_eq!(err.message, "normalization failed");

    let err = source.fetch("GATEWAY").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::ServerError);
    assert!(err.message.contains("502"));
}

#[tokio::test]
async fn test_non_json_success_is_unparseable() {
    let (addr, _handle) = start_server().await;
    let source = source_for(addr);

    let err = source.fetch("HTML").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Unparseable);
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let (addr, _handle) = start_server().await;
    let source = source_for(addr);

    let err = source.fetch("SLOW").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Network);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = source_for(addr);
    let err = source.fetch("TRACK0001").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Network);
}

#[tokio::test]
async fn test_empty_id_is_rejected_without_request() {
    let source = HttpShipmentSource::new(&PollerConfig::default()).unwrap();
    let err = source.fetch("  ").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::ClientError);
}

#[tokio::test]
async fn test_extra_headers_are_sent() {
    let (addr, _handle) = start_server().await;
    let config = PollerConfig::new(format!("http://{}/keyed", addr));
    let source = HttpShipmentSource::new(&config).unwrap().with_headers(HashMap::from([(
        "x-api-key".to_string(),
        "secret-1".to_string(),
    )]));

    let snap = source.fetch("TRACK0003").await.unwrap();
    assert_eq!(snap.normalized_status, ShipmentStatus::Delivered);
    assert_eq!(snap.carrier_name.as_deref(), Some("secret-1"));
}

#[tokio::test]
async fn test_unbuildable_request_is_network_error() {
    let (addr, _handle) = start_server().await;
    let source = source_for(addr).with_headers(HashMap::from([(
        "bad header".to_string(),
        "x".to_string(),
    )]));

    let err = source.fetch("ABC123").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Network);
    assert_eq!(err.status, None);
}
