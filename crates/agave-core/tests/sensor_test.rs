// Event building against a fixed sensor identity.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use futures_util::stream;
use pretty_assertions::assert_eq;
use serde_json::json;

use agave_core::{CoreError, HttpVersion, InboundRequest, SeenIpCache, Sensor, SensorConfig};

fn sensor() -> Sensor {
    Sensor::new(SensorConfig::new(
        "agave",
        "agave.events",
        "6b0e2f7c-1d4a-4f0e-9a55-3c2b7e1d9f00",
        "192.168.1.1",
        8080,
    ))
}

fn scan_request(remote: &str) -> InboundRequest {
    InboundRequest::new(remote, "GET", "/wp-login.php").with_host("192.168.1.1:8080")
}

#[tokio::test]
async fn http_event_carries_source_and_destination() {
    let sensor = sensor();

    let event = sensor
        .http_attack("wp-login-scan", scan_request("10.0.0.5:4444"))
        .await
        .unwrap();

    assert_eq!(event.src_ip, "10.0.0.5");
    assert_eq!(event.src_port, 4444);
    assert_eq!(event.dest_ip, "192.168.1.1");
    assert_eq!(event.dest_port, 8080);
    assert!(!event.prev_seen);
    assert_eq!(event.signature, "wp-login-scan");
    assert_eq!(event.protocol, "HTTP/1.1");
}

#[tokio::test]
async fn prev_seen_flips_after_record() {
    let sensor = sensor();

    let first = sensor.http_attack("", scan_request("10.0.0.5:4444")).await.unwrap();
    assert!(!first.prev_seen);

    // Building alone never records.
    let again = sensor.http_attack("", scan_request("10.0.0.5:5555")).await.unwrap();
    assert!(!again.prev_seen);

    sensor.cache().record("10.0.0.5");

    let seen = sensor.http_attack("", scan_request("10.0.0.5:4444")).await.unwrap();
    assert!(seen.prev_seen);

    let other = sensor.http_attack("", scan_request("10.0.0.6:4444")).await.unwrap();
    assert!(!other.prev_seen);
}

#[tokio::test]
async fn shared_cache_is_visible_across_sensors() {
    let cache = Arc::new(SeenIpCache::new());
    let config = SensorConfig::new("agave", "agave.events", "guid", "192.168.1.1", 8080);
    let a = Sensor::with_cache(config.clone(), Arc::clone(&cache));
    let b = Sensor::with_cache(config, cache);

    a.save_ip("203.0.113.7");
    assert!(b.seen_ip("203.0.113.7"));

    let event = b.http_attack("", scan_request("203.0.113.7:1234")).await.unwrap();
    assert!(event.prev_seen);
}

#[tokio::test]
async fn malformed_remote_address_builds_nothing() {
    let sensor = sensor();

    let err = sensor
        .http_attack("", scan_request("not-an-address"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::MalformedAddress { ref addr, .. } if addr == "not-an-address"));

    let err = sensor
        .credential_attack(&scan_request("not-an-address"), "admin", "admin")
        .unwrap_err();
    assert!(matches!(err, CoreError::MalformedAddress { .. }));

    assert!(sensor.cache().is_empty());
}

#[tokio::test]
async fn malformed_address_is_reported_before_the_body_is_read() {
    let body = stream::iter(vec![Err::<bytes::Bytes, _>(std::io::Error::other(
        "body must not be read",
    ))]);
    let request = InboundRequest::new("no-port", "POST", "/").with_body_stream(Box::pin(body));

    let err = sensor().http_attack("", request).await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedAddress { .. }));
}

#[tokio::test]
async fn body_read_failure_aborts_the_event() {
    let body = stream::iter(vec![
        Ok(bytes::Bytes::from_static(b"user=ad")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset")),
    ]);
    let request =
        InboundRequest::new("10.0.0.5:4444", "POST", "/login").with_body_stream(Box::pin(body));

    let err = sensor().http_attack("", request).await.unwrap_err();
    assert!(matches!(err, CoreError::Body(ref e) if e.kind() == std::io::ErrorKind::ConnectionReset));
}

#[tokio::test]
async fn ipv6_sources_are_unbracketed() {
    let event = sensor()
        .http_attack("", scan_request("[2001:db8::5]:51000"))
        .await
        .unwrap();
    assert_eq!(event.src_ip, "2001:db8::5");
    assert_eq!(event.src_port, 51000);
}

#[tokio::test]
async fn login_post_snapshot() {
    let request = InboundRequest::new("10.0.0.5:4444", "POST", "/login?next=%2Fadmin")
        .with_version(HttpVersion::HTTP_10)
        .with_host("192.168.1.1:8080")
        .with_header("content-type", "application/x-www-form-urlencoded")
        .with_header("user-agent", "zgrab/0.x")
        .with_body("user=admin&pass=hunter2");

    let event = sensor().http_attack("login", request).await.unwrap();
    let snapshot = &event.request;

    assert_eq!(event.protocol, "HTTP/1.0");
    assert_eq!(snapshot.method, "POST");
    assert_eq!(snapshot.url.path, "/login");
    assert_eq!(snapshot.url.raw_query, "next=%2Fadmin");
    assert_eq!(snapshot.header["User-Agent"], vec!["zgrab/0.x"]);
    assert_eq!(&snapshot.body[..], b"user=admin&pass=hunter2");
    assert_eq!(snapshot.post_form["user"], vec!["admin"]);
    assert_eq!(snapshot.post_form["pass"], vec!["hunter2"]);
    assert_eq!(
        snapshot.absolute_url(),
        "http://192.168.1.1:8080/login?next=%2Fadmin"
    );
}

#[tokio::test]
async fn http_event_json_field_names() {
    let request = InboundRequest::new("10.0.0.5:4444", "GET", "/.env")
        .with_host("192.168.1.1:8080")
        .with_header("Accept", "*/*");

    let event = sensor().http_attack("dotenv", request).await.unwrap();
    let value = serde_json::to_value(&event).unwrap();

    assert_eq!(
        value,
        json!({
            "Protocol": "HTTP/1.1",
            "App": "agave",
            "Channel": "agave.events",
            "sensor": "6b0e2f7c-1d4a-4f0e-9a55-3c2b7e1d9f00",
            "DestPort": 8080,
            "DestIp": "192.168.1.1",
            "SrcPort": 4444,
            "SrcIp": "10.0.0.5",
            "Signature": "dotenv",
            "PrevSeen": false,
            "Request": {
                "Method": "GET",
                "URL": {
                    "Scheme": "",
                    "Host": "",
                    "Path": "/.env",
                    "RawQuery": "",
                    "Fragment": "",
                },
                "Proto": "HTTP/1.1",
                "ProtoMajor": 1,
                "ProtoMinor": 1,
                "Header": { "Accept": ["*/*"] },
                "Body": "",
                "TransferEncoding": [],
                "Host": "192.168.1.1:8080",
                "PostForm": {},
            },
        })
    );
}

#[test]
fn credential_event_leaves_body_alone() {
    let request = InboundRequest::new("10.0.0.5:4444", "POST", "/login").with_body("user=root");

    let event = sensor()
        .credential_attack(&request, "root", "toor")
        .unwrap();

    assert_eq!(event.username, "root");
    assert_eq!(event.password, "toor");
    assert_eq!(event.src_ip, "10.0.0.5");
    assert_eq!(event.dest_port, 8080);
    assert_eq!(event.sensor_guid, "6b0e2f7c-1d4a-4f0e-9a55-3c2b7e1d9f00");
    // Still readable by whoever handles the request next.
    assert_eq!(request.method, "POST");
}
