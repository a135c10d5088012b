//! Property-based test generators using proptest.

use hemolink_server::{BloodType, LedgerStatus};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Strategy for blood types.
pub fn blood_type_strategy() -> impl Strategy<Value = BloodType> {
    prop::sample::select(BloodType::ALL.to_vec())
}

/// Strategy for ledger statuses.
pub fn ledger_status_strategy() -> impl Strategy<Value = LedgerStatus> {
    prop::sample::select(LedgerStatus::ALL.to_vec())
}

/// Strategy for ids usable as document ids.
pub fn document_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9_-]{0,23}").expect("Invalid regex")
}

/// Strategy for non-blank free text such as hospital names and locations.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9 .']{0,31}")
        .expect("Invalid regex")
        .prop_map(|s| s.trim().to_string())
}

/// Strategy for valid `create-request` bodies.
pub fn create_request_body_strategy() -> impl Strategy<Value = Value> {
    (
        text_strategy(),
        blood_type_strategy(),
        0u64..10_000,
        any::<bool>(),
    )
        .prop_map(|(hospital, blood_type, units, urgent)| {
            json!({
                "hospitalName": hospital,
                "bloodType": blood_type.as_str(),
                "unitsNeeded": units,
                "isUrgent": urgent,
            })
        })
}

/// Strategy for `create-request` bodies with exactly one invalid field.
pub fn invalid_create_request_body_strategy() -> impl Strategy<Value = Value> {
    let field = prop::sample::select(vec!["hospitalName", "bloodType", "unitsNeeded", "isUrgent"]);
    let bad = prop_oneof![
        Just(Value::Null),
        Just(json!("")),
        Just(json!(-1)),
        Just(json!(2.5)),
        Just(json!([])),
        Just(json!({})),
    ];
    (create_request_body_strategy(), field, bad, any::<bool>()).prop_filter_map(
        "replacement must be invalid for the field",
        |(mut body, field, bad, remove)| {
            let object = body.as_object_mut()?;
            if remove {
                object.remove(field);
                return Some(body);
            }
            let still_valid = match field {
                "unitsNeeded" => bad.as_u64().is_some(),
                "isUrgent" => bad.is_boolean(),
                _ => false,
            };
            if still_valid {
                return None;
            }
            object.insert(field.to_string(), bad);
            Some(body)
        },
    )
}
