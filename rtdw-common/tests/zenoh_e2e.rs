//! End-to-end tests with Zenoh pub/sub.
//!
//! Note: Zenoh requires multi-thread tokio runtime.
//! Each test uses a unique key prefix to avoid interference.

use rtdw_common::{
    CommandRequest, Format, KeyExprBuilder, PointRef, PointSample, PointUpdate, decode_auto,
    encode, parse_point_key,
};
use std::time::Duration;

/// Generate a unique test prefix to avoid test interference.
fn unique_prefix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test_{}", nanos)
}

/// A sample published on a point key reaches a device-wide subscriber.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_point_sample_pubsub() {
    let keys = KeyExprBuilder::with_prefix(unique_prefix(), "altherma");

    let session = zenoh::open(zenoh::Config::default())
        .await
        .expect("Failed to open Zenoh session");

    let subscriber = session
        .declare_subscriber(&keys.point_wildcard())
        .await
        .expect("Failed to create subscriber");

    // Give subscriber time to set up
    tokio::time::sleep(Duration::from_millis(100)).await;

    let sample = PointSample::new("altherma", "compressor", 18, PointUpdate::new(1, "100"));
    let encoded = encode(&sample, Format::Json).expect("Failed to encode");
    session
        .put(&keys.point_key("compressor"), encoded)
        .await
        .expect("Failed to publish");

    let received = tokio::time::timeout(Duration::from_secs(5), subscriber.recv_async())
        .await
        .expect("Timeout waiting for message")
        .expect("Failed to receive message");

    let key = received.key_expr().as_str().to_string();
    let parsed = parse_point_key(keys.prefix(), &key).expect("Not a point key");
    assert_eq!(parsed.device, "altherma");
    assert_eq!(parsed.point, "compressor");

    let payload = received.payload().to_bytes();
    let decoded: PointSample = decode_auto(&payload).expect("Failed to decode");
    assert_eq!(decoded.update, PointUpdate::new(1, "100"));

    drop(subscriber);
    session.close().await.expect("Failed to close session");
}

/// A CBOR command published by a hub decodes on the command key.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cbor_command_delivery() {
    let keys = KeyExprBuilder::with_prefix(unique_prefix(), "altherma");

    let session = zenoh::open(zenoh::Config::default())
        .await
        .expect("Failed to open Zenoh session");

    let subscriber = session
        .declare_subscriber(&keys.command_key())
        .await
        .expect("Failed to create subscriber");

    tokio::time::sleep(Duration::from_millis(100)).await;

    let command = CommandRequest::set_level(7u8, 45.0);
    let encoded = encode(&command, Format::Cbor).expect("Failed to encode CBOR");
    session
        .put(&keys.command_key(), encoded)
        .await
        .expect("Failed to publish");

    let received = tokio::time::timeout(Duration::from_secs(5), subscriber.recv_async())
        .await
        .expect("Timeout")
        .expect("Failed to receive");

    let payload = received.payload().to_bytes();
    let decoded: CommandRequest = decode_auto(&payload).expect("Failed to auto-decode CBOR");
    assert_eq!(decoded.point, PointRef::Unit(7));
    assert_eq!(decoded.level, 45.0);

    drop(subscriber);
    session.close().await.expect("Failed to close session");
}
