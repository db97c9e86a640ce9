//! Integration tests for the rtdw-common wire model.

use rtdw_common::{
    CommandName, CommandRequest, FailedOperation, Format, KeyExprBuilder, PointDescriptor,
    PointFailure, PointRef, PointSample, PointUpdate, PresentationKind, decode, decode_auto,
    encode, parse_point_key,
};
use std::collections::BTreeMap;

#[test]
fn test_sample_roundtrip_both_formats() {
    let sample = PointSample::new("altherma", "leaving_water_temp", 1, PointUpdate::new(0, "42.5"))
        .with_label("address", "123");

    let json = encode(&sample, Format::Json).expect("JSON encode failed");
    let decoded: PointSample = decode(&json, Format::Json).expect("JSON decode failed");
    assert_eq!(decoded.point, "leaving_water_temp");
    assert_eq!(decoded.update.display, "42.5");
    assert_eq!(decoded.labels.get("address"), Some(&"123".to_string()));

    let cbor = encode(&sample, Format::Cbor).expect("CBOR encode failed");
    assert!(cbor.len() < json.len(), "CBOR should be smaller than JSON");
    let decoded: PointSample = decode_auto(&cbor).expect("Auto decode failed");
    assert_eq!(decoded.unit, 1);
}

#[test]
fn test_hub_command_shapes() {
    let by_name: CommandRequest =
        serde_json::from_str(r#"{"point": "quiet_mode", "command": "Off"}"#).unwrap();
    assert_eq!(by_name, CommandRequest::off("quiet_mode"));

    let with_hue: CommandRequest = serde_json::from_str(
        r#"{"point": 11, "command": "Set Level", "level": 20, "hue": {"r": 0}}"#,
    )
    .unwrap();
    assert_eq!(with_hue.point, PointRef::Unit(11));
    assert_eq!(with_hue.command, CommandName::SetLevel);
    assert!(with_hue.hue.is_some());

    let unknown = serde_json::from_str::<CommandRequest>(r#"{"point": 11, "command": "Toggle"}"#);
    assert!(unknown.is_err());
}

#[test]
fn test_descriptor_announcement() {
    let mut options = BTreeMap::new();
    options.insert("LevelOffHidden".to_string(), "true".to_string());

    let descriptor = PointDescriptor {
        unit: 14,
        point: "leaving_water_shift".to_string(),
        name: "Leaving water temperature shift".to_string(),
        kind: PresentationKind::Selector,
        used: true,
        description: Some("Adjustable between -5 and +5 °C".to_string()),
        options,
    };

    let json = serde_json::to_value(&descriptor).unwrap();
    assert_eq!(json["kind"], "selector");
    assert_eq!(json["options"]["LevelOffHidden"], "true");

    let back: PointDescriptor = serde_json::from_value(json).unwrap();
    assert_eq!(back, descriptor);
}

#[test]
fn test_failure_keys_match_points() {
    let keys = KeyExprBuilder::new("altherma");
    let failure = PointFailure::new("altherma", "defrost", 21, FailedOperation::Read, "timeout");

    assert_eq!(
        keys.failure_key(&failure.point),
        "zensight/rtdw/altherma/@/errors/defrost"
    );
    assert!(parse_point_key(keys.prefix(), &keys.failure_key(&failure.point)).is_none());
    assert!(parse_point_key(keys.prefix(), &keys.point_key(&failure.point)).is_some());
}
