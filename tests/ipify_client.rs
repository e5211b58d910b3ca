//! Runs the real ipify client against a local stand-in for the geolocation API.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{routing::get, Router};
use tokio::net::TcpListener;

use ip_tracker::lookup::Phase;
use ip_tracker::{GeoLookup, IpifyClient, LookupController, LookupError, Settings, Transition};

const API_KEY: &str = "test-key";

const GOOGLE: &str = r#"{
    "ip": "8.8.8.8",
    "isp": "Google LLC",
    "location": {"city": "Mountain View", "timezone": "-08:00", "lat": 37.4056, "lng": -122.0775}
}"#;

const CLOUDFLARE_NO_ISP: &str = r#"{
    "ip": "1.1.1.1",
    "location": {"city": "Sydney", "timezone": "+10:00", "lat": -33.8688, "lng": 151.2093}
}"#;

async fn geo(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let json = [(header::CONTENT_TYPE, "application/json")];

    if params.get("apiKey").map(String::as_str) != Some(API_KEY) {
        return (
            StatusCode::FORBIDDEN,
            json,
            r#"{"code":403,"messages":"Access restricted. Check credits balance or enter the correct API key."}"#.to_string(),
        );
    }

    match params.get("ipAddress").map(String::as_str).unwrap_or("") {
        "8.8.8.8" => (StatusCode::OK, json, GOOGLE.to_string()),
        "1.1.1.1" => (StatusCode::OK, json, CLOUDFLARE_NO_ISP.to_string()),
        "garbled.example" => (StatusCode::OK, json, "{\"ip\": \"1.2.3.4\", \"loc".to_string()),
        "slow.example" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            (StatusCode::OK, json, GOOGLE.to_string())
        }
        _ => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json,
            r#"{"code":422,"messages":"Input correct IPv4 or IPv6 address."}"#.to_string(),
        ),
    }
}

/// Starts the stand-in API and returns its endpoint URL.
async fn start_geo_server() -> String {
    let app = Router::new().route("/api/v2/country,city", get(geo));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get address");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Server failed to start");
    });

    format!("http://{}/api/v2/country,city", addr)
}

fn settings_for(endpoint: &str, key: &str) -> Settings {
    Settings {
        api_key: Some(key.to_string()),
        endpoint: endpoint.to_string(),
        ..Settings::default()
    }
}

#[tokio::test]
async fn resolves_seed_address() {
    let endpoint = start_geo_server().await;
    let client = IpifyClient::new(&settings_for(&endpoint, API_KEY)).unwrap();

    let result = client.lookup("8.8.8.8").await.unwrap();

    assert_eq!(result.ip, "8.8.8.8");
    assert_eq!(result.city, "Mountain View");
    assert_eq!(result.timezone, "-08:00");
    assert_eq!(result.isp, "Google LLC");
    assert_eq!((result.lat, result.lng), (37.4056, -122.0775));
}

#[tokio::test]
async fn missing_isp_comes_back_empty() {
    let endpoint = start_geo_server().await;
    let client = IpifyClient::new(&settings_for(&endpoint, API_KEY)).unwrap();

    let result = client.lookup("1.1.1.1").await.unwrap();
    assert_eq!(result.isp, "");
}

#[tokio::test]
async fn rejected_query_is_remote_error() {
    let endpoint = start_geo_server().await;
    let client = IpifyClient::new(&settings_for(&endpoint, API_KEY)).unwrap();

    match client.lookup("not-a-real-host").await {
        Err(LookupError::Remote { status, message }) => {
            assert_eq!(status.as_u16(), 422);
            assert_eq!(message, "Input correct IPv4 or IPv6 address.");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn wrong_key_is_remote_error() {
    let endpoint = start_geo_server().await;
    let client = IpifyClient::new(&settings_for(&endpoint, "wrong")).unwrap();

    assert!(matches!(
        client.lookup("8.8.8.8").await,
        Err(LookupError::Remote { status, .. }) if status.as_u16() == 403
    ));
}

#[tokio::test]
async fn truncated_body_is_parse_error() {
    let endpoint = start_geo_server().await;
    let client = IpifyClient::new(&settings_for(&endpoint, API_KEY)).unwrap();

    assert!(matches!(
        client.lookup("garbled.example").await,
        Err(LookupError::Parse(_))
    ));
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let endpoint = format!("http://{}/api/v2/country,city", addr);
    let client = IpifyClient::new(&settings_for(&endpoint, API_KEY)).unwrap();

    let err = client.lookup("8.8.8.8").await.unwrap_err();
    assert!(matches!(err, LookupError::Network(_)));
    assert!(!err.to_string().contains(API_KEY));
    assert!(!format!("{:?}", err).contains(API_KEY));
}

#[tokio::test]
async fn configured_timeout_cuts_off_slow_lookups() {
    let endpoint = start_geo_server().await;
    let mut settings = settings_for(&endpoint, API_KEY);
    settings.request_timeout = Some(Duration::from_millis(200));
    let client = IpifyClient::new(&settings).unwrap();

    let err = client.lookup("slow.example").await.unwrap_err();
    match &err {
        LookupError::Network(e) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(!err.to_string().contains(API_KEY));
}

#[tokio::test]
async fn failed_second_query_keeps_seed_result() {
    let endpoint = start_geo_server().await;
    let client = IpifyClient::new(&settings_for(&endpoint, API_KEY)).unwrap();
    let controller = LookupController::new(client, "8.8.8.8");

    assert!(matches!(controller.start().await, Some(Transition::Applied(_))));
    let seed = controller.current_result();

    controller.update_query("not-a-real-host");
    let transition = controller.on_submit_click().await;

    assert!(matches!(transition, Transition::Failed(LookupError::Remote { .. })));
    assert_eq!(controller.current_result(), seed);
    assert_eq!(controller.phase(), Phase::HasResult);
}
