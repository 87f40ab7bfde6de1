//! Lenient conversions of raw Growatt field values.
//!
//! The API mixes numbers, numeric strings and the literal `"null"` for the same fields.

use chrono::NaiveTime;
use serde_json::Value;

/// Integer part of a number or numeric string, like `int(float(value))`.
#[expect(clippy::cast_possible_truncation)]
pub fn as_integer(value: &Value) -> Option<i64> {
    let float = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(string) => string.trim().parse::<f64>().ok()?,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        _ => return None,
    };
    float.is_finite().then(|| float.trunc() as i64)
}

/// Parse `H:M` or `HH:MM[:SS]`.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let mut parts = text.trim().split(':');
    let hour = parts.next()?.trim().parse().ok()?;
    let minute = parts.next()?.trim().parse().ok()?;
    let second = match parts.next() {
        Some(second) => second.trim().parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Time stored as a string field, `None` for anything else including `"null"`.
pub fn as_time(value: &Value) -> Option<NaiveTime> {
    value.as_str().and_then(parse_time)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn as_integer_ok() {
        assert_eq!(as_integer(&json!(80)), Some(80));
        assert_eq!(as_integer(&json!(80.9)), Some(80));
        assert_eq!(as_integer(&json!("95")), Some(95));
        assert_eq!(as_integer(&json!("95.0")), Some(95));
        assert_eq!(as_integer(&json!(true)), Some(1));
        assert_eq!(as_integer(&json!("null")), None);
        assert_eq!(as_integer(&Value::Null), None);
    }

    #[test]
    fn parse_time_ok() {
        assert_eq!(parse_time("1:5"), NaiveTime::from_hms_opt(1, 5, 0));
        assert_eq!(parse_time("14:00"), NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(parse_time("23:59:30"), NaiveTime::from_hms_opt(23, 59, 30));
    }

    #[test]
    fn parse_time_err() {
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("12"), None);
        assert_eq!(parse_time("null"), None);
        assert_eq!(parse_time("1:2:3:4"), None);
    }
}
