//! Unit tests for the field extraction engine.
//!
//! Run with: cargo test --test extraction_unit_test

use motor_telemetry::entity::MotorStatus;
use motor_telemetry::parser::{extract, TelemetryFields};

fn fields(text: &str) -> TelemetryFields {
    extract(text).expect("extraction never fails on plain text")
}

#[test]
fn motor_voltage_and_current_are_extracted() {
    let f = fields("Motor: ON Voltage:12.5 Current:2.3");

    assert_eq!(f.motor_status, MotorStatus::On);
    assert_eq!(f.voltage, Some(12.5));
    assert_eq!(f.current, Some(2.3));
    assert_eq!(f.water_level, None);
    assert_eq!(f.mode, None);
    assert_eq!(f.clock, None);
    assert_eq!(f.run_time, None);
}

#[test]
fn text_without_fields_defaults_to_status() {
    assert_eq!(fields("Status check"), TelemetryFields::default());
    assert_eq!(fields("Status check").motor_status, MotorStatus::Status);
}

#[test]
fn empty_text_yields_default_fields() {
    assert_eq!(fields(""), TelemetryFields::default());
}

#[test]
fn run_time_requires_a_unit() {
    assert_eq!(fields("Run Time: 45 sec").run_time, Some(45));
    assert_eq!(fields("Run Time: 45").run_time, None);
    assert_eq!(fields("Run Time: 45 minutes").run_time, None);
}

#[test]
fn run_time_accepts_every_unit_spelling() {
    assert_eq!(fields("Run Time: 45s").run_time, Some(45));
    assert_eq!(fields("run time 46 secs").run_time, Some(46));
    assert_eq!(fields("RunTime:120 seconds").run_time, Some(120));
    assert_eq!(fields("Run Time : 7 S").run_time, Some(7));
}

#[test]
fn malformed_number_leaves_only_that_field_absent() {
    let f = fields("Voltage: 12.5.6 Current: 3");

    assert_eq!(f.voltage, None);
    assert_eq!(f.current, Some(3.0));
}

#[test]
fn sentence_ending_period_is_not_part_of_the_number() {
    let f = fields("Voltage: 230.5. Current: 2. Water Level: 80.");

    assert_eq!(f.voltage, Some(230.5));
    assert_eq!(f.current, Some(2.0));
    assert_eq!(f.water_level, Some(80.0));
}

#[test]
fn labels_are_case_insensitive_and_order_independent() {
    let f = fields("CURRENT 1.75 water level: 80 motor off VOLTAGE : 231");

    assert_eq!(f.motor_status, MotorStatus::Off);
    assert_eq!(f.voltage, Some(231.0));
    assert_eq!(f.current, Some(1.75));
    assert_eq!(f.water_level, Some(80.0));
}

#[test]
fn water_level_tolerates_missing_space_and_trailing_unit() {
    assert_eq!(fields("WaterLevel:64.5%").water_level, Some(64.5));
    assert_eq!(fields("Water Level: 75 cm").water_level, Some(75.0));
}

#[test]
fn mode_is_a_single_alphanumeric_token() {
    assert_eq!(fields("Mode: AUTO Motor: ON").mode.as_deref(), Some("AUTO"));
    assert_eq!(fields("mode manual2, more text").mode.as_deref(), Some("manual2"));
    assert_eq!(fields("Model X100").mode, None);
}

#[test]
fn clock_accepts_toggle_or_time_of_day() {
    assert_eq!(fields("Clock: ON").clock.as_deref(), Some("ON"));
    assert_eq!(fields("clock off").clock.as_deref(), Some("off"));
    assert_eq!(fields("Clock: 7:05").clock.as_deref(), Some("7:05"));
    assert_eq!(fields("Clock: 10:45:30 PM").clock.as_deref(), Some("10:45:30 PM"));
    assert_eq!(fields("Clock:06:30am").clock.as_deref(), Some("06:30am"));
}

#[test]
fn clock_toggle_wins_over_a_later_time() {
    assert_eq!(fields("Clock: ON 10:30").clock.as_deref(), Some("ON"));
}

#[test]
fn full_status_report_is_parsed() {
    let text = "Motor: OFF\nVoltage: 229.8\nCurrent: 0\nWater Level: 92.5\n\
                Mode: AUTO\nClock: 06:15 AM\nRun Time: 3600 sec";
    let f = fields(text);

    assert_eq!(
        f,
        TelemetryFields {
            motor_status: MotorStatus::Off,
            voltage: Some(229.8),
            current: Some(0.0),
            water_level: Some(92.5),
            mode: Some("AUTO".to_string()),
            clock: Some("06:15 AM".to_string()),
            run_time: Some(3600),
        }
    );
}

#[test]
fn extraction_is_deterministic() {
    let text = "Motor: ON Voltage:12.5 Current:2.3 Run Time: 45 sec";
    assert_eq!(fields(text), fields(text));
}

#[test]
fn motor_token_without_state_falls_back_to_status() {
    assert_eq!(fields("Motor: starting").motor_status, MotorStatus::Status);
}
