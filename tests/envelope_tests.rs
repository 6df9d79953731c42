//! Wire envelope parsing and the bridge entry point.

mod common;

use bridgeapi::envelope::{is_not_found, Envelope, EMPTY_RESPONSE};
use bridgeapi::{Dispatcher, Method, RouteSpec};
use common::{parse, UserController, USERS_BASE};
use serde_json::json;

#[test]
fn test_round_trip_preserves_fields() {
    let original = Envelope::new(Method::Patch, "/api/v1/users/1/user-type?dry=true")
        .with_header("X-Token", "abc")
        .with_header("Accept", "application/json")
        .with_body(json!({"name": "John", "age": 30, "type": "1"}));
    let wire = original.to_json().unwrap();
    let parsed = Envelope::from_json(&wire).unwrap();
    assert_eq!(parsed, original);
    assert!(wire.contains("\"pathAndQuery\""));
    assert!(wire.contains("\"PATCH\""));
}

#[test]
fn test_missing_headers_and_body() {
    let parsed = Envelope::from_json(r#"{"pathAndQuery":"/a?b=c","method":"DELETE"}"#).unwrap();
    assert!(parsed.headers.is_empty());
    assert!(parsed.body.is_null());
    assert_eq!(parsed.split_path_and_query(), ("/a", "b=c"));
}

#[test]
fn test_unknown_method_is_malformed() {
    assert!(Envelope::from_json(r#"{"pathAndQuery":"/a","method":"OPTIONS"}"#).is_err());
    assert!(Envelope::from_json(r#"{"method":"GET"}"#).is_err());
}

#[test]
fn test_bridge_request_matches_routing_request() {
    let d = Dispatcher::builder()
        .register_controller(USERS_BASE, UserController)
        .build();
    let envelope = Envelope::new(Method::Get, "api/v1/users/all?order=DESC")
        .to_json()
        .unwrap();
    let via_envelope = d.bridge_request(&envelope);
    let direct = d.routing_request(
        "api/v1/users/all?order=DESC",
        Method::Get,
        Default::default(),
        serde_json::Value::Null,
    );
    assert_eq!(via_envelope, direct);
    assert_eq!(parse(&via_envelope)["data"][0]["name"], json!("Jane"));
}

#[test]
fn test_response_markers() {
    let d = Dispatcher::builder()
        .register_routes("/unit", vec![RouteSpec::post("").handle(|_| Ok(()))])
        .build();
    let unit = Envelope::new(Method::Post, "/unit").to_json().unwrap();
    assert_eq!(d.bridge_request(&unit), EMPTY_RESPONSE);

    let miss = Envelope::new(Method::Get, "/unit").to_json().unwrap();
    let response = d.bridge_request(&miss);
    assert!(is_not_found(&response));
    assert!(!is_not_found(EMPTY_RESPONSE));
}
