//! One recognizer per field. Each pattern is compiled once and shared by
//! every extraction call.

use regex::Regex;
use std::sync::LazyLock;

use crate::entity::MotorStatus;

/// `<label> [:]? <number>`. Every dot-separated digit group is captured so a
/// malformed value such as `12.5.6` is seen whole and rejected, not truncated.
/// A dot with no digit after it ends the number.
fn labeled_number(label: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{label}\s*:?\s*(\d+(?:\.\d+)*)")).expect("labeled number regex")
}

static MOTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmotor\s*:?\s*(on|off)\b").expect("motor regex"));

static VOLTAGE_RE: LazyLock<Regex> = LazyLock::new(|| labeled_number("voltage"));

static CURRENT_RE: LazyLock<Regex> = LazyLock::new(|| labeled_number("current"));

static WATER_LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| labeled_number(r"water\s*level"));

// The label must be followed by a separator or whitespace so `model` is not read as `mode`.
static MODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bmode(?:\s*:\s*|\s+)([a-z0-9]+)").expect("mode regex")
});

// ON/OFF is tried before the time-of-day alternative.
static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bclock\s*:?\s*(on\b|off\b|\d{1,2}:\d{2}(?::\d{2})?(?:\s?(?:am|pm)\b)?)")
        .expect("clock regex")
});

// Longer unit spellings first so `seconds` is not read as `s` + trailing text.
static RUN_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\brun\s*time\s*:?\s*(\d+)\s*(?:seconds|secs|sec|s)\b").expect("run time regex")
});

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub(crate) fn motor_status(text: &str) -> Option<MotorStatus> {
    let token = first_capture(&MOTOR_RE, text)?;
    if token.eq_ignore_ascii_case("on") {
        Some(MotorStatus::On)
    } else {
        Some(MotorStatus::Off)
    }
}

fn decimal(re: &Regex, text: &str) -> Option<f64> {
    first_capture(re, text)?.parse().ok()
}

pub(crate) fn voltage(text: &str) -> Option<f64> {
    decimal(&VOLTAGE_RE, text)
}

pub(crate) fn current(text: &str) -> Option<f64> {
    decimal(&CURRENT_RE, text)
}

pub(crate) fn water_level(text: &str) -> Option<f64> {
    decimal(&WATER_LEVEL_RE, text)
}

pub(crate) fn mode(text: &str) -> Option<String> {
    first_capture(&MODE_RE, text).map(str::to_string)
}

pub(crate) fn clock(text: &str) -> Option<String> {
    first_capture(&CLOCK_RE, text).map(str::to_string)
}

pub(crate) fn run_time(text: &str) -> Option<i64> {
    first_capture(&RUN_TIME_RE, text)?.parse().ok()
}
