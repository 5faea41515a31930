//! Field decoders for persisted run files.
//!
//! Files on disk may come from older versions or other tools. A field with
//! an unexpected type decodes to its default instead of failing the whole
//! document.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::policy::Policy;

use super::meta::RunStatus;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

fn value<'de, D: Deserializer<'de>>(d: D) -> Result<Value, D::Error> {
    Value::deserialize(d)
}

/// Text fields; anything but a string becomes empty.
pub(crate) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match value(d)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

pub(crate) fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match value(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Identifiers, which older writers stored as integers.
pub(crate) fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match value(d)? {
        Value::String(s) => s,
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        },
        _ => String::new(),
    })
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|f: &f64| f.is_finite())
}

fn as_count(v: &Value) -> Option<usize> {
    as_f64(v)
        .filter(|f| *f >= 0.0 && f.fract() == 0.0)
        .map(|f| f as usize)
}

pub(crate) fn count<'de, D: Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
    Ok(as_count(&value(d)?).unwrap_or_default())
}

pub(crate) fn opt_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
    Ok(as_count(&value(d)?))
}

pub(crate) fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(as_f64(&value(d)?))
}

pub(crate) fn opt_f32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
    Ok(as_f64(&value(d)?).map(|f| f as f32))
}

/// RFC 3339, or a timestamp without offset read as UTC.
pub(crate) fn timestamp<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Value::String(raw) = value(d)? else {
        return Ok(None);
    };
    Ok(parse_timestamp(raw.trim()))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub(crate) fn status<'de, D: Deserializer<'de>>(d: D) -> Result<RunStatus, D::Error> {
    Ok(serde_json::from_value(value(d)?).unwrap_or_default())
}

/// A policy snapshot that no longer validates is dropped, not fatal.
pub(crate) fn policy<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Policy>, D::Error> {
    Ok(match value(d)? {
        Value::Null => None,
        v => serde_json::from_value(v)
            .map_err(|err| log::debug!("ignoring unreadable policy snapshot: {err}"))
            .ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("2024-01-01T00:00:00Z", Some((0, 0)))]
    #[case("2024-01-01T02:00:00+02:00", Some((0, 0)))]
    #[case("2024-01-01T00:00:00.123456", Some((0, 123_456_000)))]
    #[case("2024-01-01 00:00:00", Some((0, 0)))]
    #[case("yesterday", None)]
    fn timestamps(#[case] raw: &str, #[case] expected: Option<(u32, u32)>) {
        let parsed = parse_timestamp(raw);
        let expected = expected.map(|(sec, nanos)| {
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, sec).unwrap()
                + chrono::Duration::nanoseconds(nanos as i64)
        });
        assert_eq!(parsed, expected);
    }

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(deserialize_with = "id")]
        id: String,
        #[serde(deserialize_with = "count")]
        n: usize,
    }

    #[rstest]
    #[case(r#"{"id": 7, "n": "3"}"#, "7", 3)]
    #[case(r#"{"id": 7.0, "n": 3.0}"#, "7", 3)]
    #[case(r#"{"id": "a", "n": -1}"#, "a", 0)]
    #[case(r#"{"id": null, "n": "lots"}"#, "", 0)]
    fn ids_and_counts(#[case] json: &str, #[case] id: &str, #[case] n: usize) {
        let row: Row = serde_json::from_str(json).unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.n, n);
    }
}
