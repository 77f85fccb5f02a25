// Schema validation tests for the MQTT wire format
//
// These tests construct JSON values directly (independent of Rust structs)
// and validate them against the JSON Schema files in schemas/mqtt/.

use serde_json::json;

use alarmo_keypad_bridge::KeypadState;

fn load_schema(name: &str) -> serde_json::Value {
    let path = format!("{}/schemas/mqtt/{name}", env!("CARGO_MANIFEST_DIR"));
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read schema {path}: {e}"));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("Failed to parse schema {path}: {e}"))
}

fn build_validator(schema_name: &str) -> jsonschema::Validator {
    let schema = load_schema(schema_name);
    jsonschema::validator_for(&schema)
        .unwrap_or_else(|e| panic!("Failed to compile schema {schema_name}: {e}"))
}

fn validate(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    let errors: Vec<_> = validator.iter_errors(instance).collect();
    if !errors.is_empty() {
        let msgs: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
        panic!(
            "Schema validation failed for {schema_name}:\n{}\nInstance: {}",
            msgs.join("\n"),
            serde_json::to_string_pretty(instance).unwrap()
        );
    }
}

fn validate_fails(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    assert!(
        !validator.is_valid(instance),
        "Expected schema validation to fail for {schema_name}, but it passed.\nInstance: {}",
        serde_json::to_string_pretty(instance).unwrap()
    );
}

const ALL_KEYPAD_STATES: [KeypadState; 27] = [
    KeypadState::Disarmed,
    KeypadState::Triggered,
    KeypadState::Unavailable,
    KeypadState::Arming,
    KeypadState::ArmingHome,
    KeypadState::ArmingAway,
    KeypadState::ArmingNight,
    KeypadState::ArmingVacation,
    KeypadState::ArmingCustomBypass,
    KeypadState::Pending,
    KeypadState::PendingHome,
    KeypadState::PendingAway,
    KeypadState::PendingNight,
    KeypadState::PendingVacation,
    KeypadState::PendingCustomBypass,
    KeypadState::ArmedHome,
    KeypadState::ArmedAway,
    KeypadState::ArmedNight,
    KeypadState::ArmedVacation,
    KeypadState::ArmedHomeBypass,
    KeypadState::ArmedAwayBypass,
    KeypadState::ArmedNightBypass,
    KeypadState::ArmedVacationBypass,
    KeypadState::ArmedCustomBypass,
    KeypadState::FailedToArm,
    KeypadState::IncorrectPin,
    KeypadState::Unknown,
];

// =========================================================================
// Keypad state
// =========================================================================

#[test]
fn keypad_state_valid() {
    validate(
        "keypad_state.schema.json",
        &json!({
            "now": 1775000000000_u64,
            "op": "KEYPAD_STATE",
            "state": "armed_home_bypass",
            "pretty": "Armed Home (Bypass)"
        }),
    );
}

#[test]
fn keypad_state_schema_covers_every_variant() {
    // The schema enum and the Rust enum must not drift apart
    for state in ALL_KEYPAD_STATES {
        validate(
            "keypad_state.schema.json",
            &json!({
                "now": 0,
                "op": "KEYPAD_STATE",
                "state": state.as_str(),
                "pretty": state.pretty()
            }),
        );
    }
}

#[test]
fn keypad_state_rejects_unknown_value() {
    validate_fails(
        "keypad_state.schema.json",
        &json!({
            "now": 0,
            "op": "KEYPAD_STATE",
            "state": "armed_perimeter",
            "pretty": "Armed Perimeter"
        }),
    );
}

#[test]
fn keypad_state_rejects_wrong_op() {
    validate_fails(
        "keypad_state.schema.json",
        &json!({
            "now": 0,
            "op": "READY_TO_ARM",
            "state": "disarmed",
            "pretty": "Disarmed"
        }),
    );
}

#[test]
fn keypad_state_rejects_missing_pretty() {
    validate_fails(
        "keypad_state.schema.json",
        &json!({
            "now": 0,
            "op": "KEYPAD_STATE",
            "state": "disarmed"
        }),
    );
}

#[test]
fn keypad_state_rejects_extra_fields() {
    validate_fails(
        "keypad_state.schema.json",
        &json!({
            "now": 0,
            "op": "KEYPAD_STATE",
            "state": "disarmed",
            "pretty": "Disarmed",
            "color": "green"
        }),
    );
}

// =========================================================================
// Ready state
// =========================================================================

#[test]
fn ready_state_valid() {
    for state in ["ready", "not_ready", "unknown"] {
        validate(
            "ready_state.schema.json",
            &json!({
                "now": 1775000000000_u64,
                "op": "READY_TO_ARM",
                "state": state
            }),
        );
    }
}

#[test]
fn ready_state_rejects_keypad_value() {
    validate_fails(
        "ready_state.schema.json",
        &json!({
            "now": 0,
            "op": "READY_TO_ARM",
            "state": "disarmed"
        }),
    );
}

#[test]
fn ready_state_rejects_missing_now() {
    validate_fails(
        "ready_state.schema.json",
        &json!({
            "op": "READY_TO_ARM",
            "state": "ready"
        }),
    );
}

// =========================================================================
// Panel state (inbound)
// =========================================================================

#[test]
fn panel_state_minimal() {
    validate("panel_state.schema.json", &json!({ "state": "disarmed" }));
}

#[test]
fn panel_state_full() {
    validate(
        "panel_state.schema.json",
        &json!({
            "entity_id": "alarm_control_panel.alarmo",
            "state": "pending",
            "arm_mode": null,
            "next_state": "armed_away",
            "bypassed_sensors": ["binary_sensor.front_door"]
        }),
    );
}

#[test]
fn panel_state_rejects_missing_state() {
    validate_fails(
        "panel_state.schema.json",
        &json!({ "entity_id": "alarm_control_panel.alarmo" }),
    );
}

#[test]
fn panel_state_rejects_non_string_sensors() {
    validate_fails(
        "panel_state.schema.json",
        &json!({ "state": "armed_home", "bypassed_sensors": [1, 2] }),
    );
}
