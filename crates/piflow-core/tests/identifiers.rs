// crates/piflow-core/tests/identifiers.rs
// ============================================================================
// Module: Identifier Tests
// Description: Tests for opaque identifiers and device identifier parsing.
// Purpose: Ensure ids serialize as plain strings and device ids fail closed.
// Dependencies: piflow-core, serde_json
// ============================================================================
//! ## Overview
//! Validates identifier wrappers and the syntactic checks on device URIs.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use piflow_core::ActionId;
use piflow_core::ActionParamId;
use piflow_core::AppId;
use piflow_core::DeviceId;
use piflow_core::DeviceIdError;
use piflow_core::MatchFieldId;
use piflow_core::TableId;
use piflow_core::core::identifiers::MAX_DEVICE_ID_LENGTH;

macro_rules! assert_id_roundtrip {
    ($ty:ty, $value:expr) => {{
        let id = <$ty>::new($value);
        assert_eq!(id.as_str(), $value);
        assert_eq!(id.to_string(), $value);

        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", $value));

        let decoded: $ty = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, id);
    }};
}

#[test]
fn opaque_identifiers_roundtrip_as_strings() {
    assert_id_roundtrip!(TableId, "ingress.routing.router_interface_table");
    assert_id_roundtrip!(MatchFieldId, "router_interface_id");
    assert_id_roundtrip!(ActionId, "ingress.routing.set_port_and_src_mac");
    assert_id_roundtrip!(ActionParamId, "src_mac");
    assert_id_roundtrip!(AppId, "org.foo.app");
}

#[test]
fn device_id_parses_scheme_and_body() {
    let device = DeviceId::parse("device:leaf1").expect("valid device id");
    assert_eq!(device.as_str(), "device:leaf1");
    assert_eq!(device.scheme(), "device");
    assert_eq!(device.body(), "leaf1");
    assert_eq!(device.to_string(), "device:leaf1");
}

#[test]
fn device_id_keeps_the_given_string() {
    for input in ["Device:leaf1", "http://Leaf1", "device:le\u{e4}f1", "device:leaf1"] {
        let device = DeviceId::parse(input).expect("valid device id");
        assert_eq!(device.as_str(), input);
        assert_eq!(String::from(device.clone()), input);

        let json = serde_json::to_string(&device).expect("serialize");
        let decoded: DeviceId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.as_str(), input);
    }
    assert_eq!(DeviceId::parse("Device:leaf1").unwrap().scheme(), "Device");
    assert_ne!(DeviceId::parse("Device:leaf1").unwrap(), DeviceId::parse("device:leaf1").unwrap());
}

#[test]
fn device_id_rejects_whitespace() {
    assert_eq!(DeviceId::parse("not a uri"), Err(DeviceIdError::IllegalCharacter));
}

#[test]
fn device_id_rejects_missing_scheme() {
    assert!(matches!(DeviceId::parse("leaf1"), Err(DeviceIdError::Malformed(_))));
}

#[test]
fn device_id_rejects_empty_and_bodyless_input() {
    assert_eq!(DeviceId::parse(""), Err(DeviceIdError::Empty));
    assert_eq!(DeviceId::parse("device:"), Err(DeviceIdError::MissingBody));
}

#[test]
fn device_id_rejects_oversized_input() {
    let long = format!("device:{}", "a".repeat(MAX_DEVICE_ID_LENGTH));
    assert_eq!(DeviceId::parse(&long), Err(DeviceIdError::TooLong));
}

#[test]
fn device_id_deserialization_validates() {
    let decoded: DeviceId = serde_json::from_str("\"device:leaf1\"").expect("valid");
    assert_eq!(decoded.body(), "leaf1");
    assert!(serde_json::from_str::<DeviceId>("\"not a uri\"").is_err());
}
