//! Field rules shared by request payloads
//!
//! The functions here plug into `validator` derives as `custom` rules, so they
//! return `ValidationError`s carrying a stable code and a readable message.

use std::borrow::Cow;
use std::net::IpAddr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use validator::ValidationError;

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Build a validation error with a fixed code and message
pub fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Parse a user supplied timestamp
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (and the `T` separated form) read
/// as UTC, or a bare `YYYY-MM-DD` meaning midnight UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a calendar date, also accepting any timestamp form of [`parse_datetime`]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(value).map(|dt| dt.date_naive()))
}

pub fn validate_date(value: &str) -> Result<(), ValidationError> {
    match parse_date(value) {
        Some(_) => Ok(()),
        None => Err(rule_error("date", "must be a valid date")),
    }
}

/// The value must parse as a timestamp strictly after now
pub fn validate_future_datetime(value: &str) -> Result<(), ValidationError> {
    match parse_datetime(value) {
        None => Err(rule_error("date", "The expiration date must be a valid date")),
        Some(at) if at <= Utc::now() => Err(rule_error(
            "after",
            "The expiration date must be in the future",
        )),
        Some(_) => Ok(()),
    }
}

pub fn validate_ip_address(value: &str) -> Result<(), ValidationError> {
    value
        .trim()
        .parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| rule_error("ip", "The IP restriction must be a valid IP address"))
}

/// The value must be a JSON string
pub fn validate_string(value: &Value) -> Result<(), ValidationError> {
    match value {
        Value::String(_) => Ok(()),
        _ => Err(rule_error("string", "must be a string")),
    }
}

/// The value must be a whole JSON number
pub fn validate_integer(value: &Value) -> Result<(), ValidationError> {
    match value.as_i64() {
        Some(_) => Ok(()),
        None => Err(rule_error("integer", "must be an integer")),
    }
}

pub fn validate_boolean(value: &Value) -> Result<(), ValidationError> {
    match value {
        Value::Bool(_) => Ok(()),
        _ => Err(rule_error("boolean", "must be true or false")),
    }
}

/// The value must be an array whose items are all strings
pub fn validate_string_array(value: &Value) -> Result<(), ValidationError> {
    match value.as_array() {
        Some(items) if items.iter().all(Value::is_string) => Ok(()),
        Some(_) => Err(rule_error("array", "must only contain strings")),
        None => Err(rule_error("array", "must be an array")),
    }
}

/// Metadata must be a JSON object
pub fn validate_metadata(value: &Value) -> Result<(), ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(rule_error("object", "The metadata must be an object"))
    }
}
