use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Bool,
    Int,
    Float,
    Str,
    Timestamp,
    List,
    Json,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Str => "str",
            DataType::Timestamp => "timestamp",
            DataType::List => "list",
            DataType::Json => "json",
        };
        f.write_str(name)
    }
}

/// A single cell. `Null` is the absence of a value of any type - unparseable
/// fields degrade to it instead of failing the containing table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert toward `target`, yielding `Null` for anything unparseable.
    /// The conversion is row-local by construction: no input value can make
    /// a cast fail.
    pub fn cast(&self, target: DataType) -> Value {
        match (self, target) {
            (Value::Null, _) => Value::Null,
            (Value::Bool(_), DataType::Bool)
            | (Value::Int(_), DataType::Int)
            | (Value::Float(_), DataType::Float)
            | (Value::Str(_), DataType::Str)
            | (Value::Timestamp(_), DataType::Timestamp)
            | (Value::List(_), DataType::List)
            | (Value::Json(_), DataType::Json) => self.clone(),
            (Value::Str(s), DataType::Timestamp) => {
                parse_timestamp(s).map_or(Value::Null, Value::Timestamp)
            }
            (Value::Str(s), DataType::Float) => {
                s.trim().parse::<f64>().map_or(Value::Null, Value::Float)
            }
            (Value::Str(s), DataType::Int) => {
                s.trim().parse::<i64>().map_or(Value::Null, Value::Int)
            }
            (Value::Str(s), DataType::Bool) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Null,
            },
            (Value::Int(i), DataType::Float) => Value::Float(*i as f64),
            (Value::Float(f), DataType::Int) if f.is_finite() => Value::Int(*f as i64),
            (_, DataType::Str) => Value::Str(self.render()),
            _ => Value::Null,
        }
    }

    /// The textual form used for CSV cells. `Null` renders as the empty
    /// field, timestamps as RFC-3339, lists comma-joined, nested json
    /// compact-serialized.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
            Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::List(items) => items
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(","),
            Value::Json(v) => v.to_string(),
        }
    }

    /// Order two values of the same kind; `None` when they are not
    /// comparable (mixed kinds, NaN, nulls - null ordering is the caller's
    /// policy, not the value's).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            _ => None,
        }
    }

    pub fn from_json(v: serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    n.as_f64().map_or(Value::Null, Value::Float)
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            nested => Value::Json(nested),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(ts) => {
                serde_json::Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Json(v) => v.clone(),
        }
    }
}

/// Parse an ISO-8601 timestamp. Values without an offset designator are
/// taken as UTC - upstream producers emit both `2024-01-01T10:00:00Z` and
/// bare `2024-01-01T10:00:00`.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    // Date-only values come up in dimension feeds (signup_date).
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cast_parses_rfc3339_and_offsetless_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 5, 0).unwrap();
        for raw in [
            "2024-01-01T10:05:00Z",
            "2024-01-01T10:05:00+00:00",
            "2024-01-01T10:05:00",
            "2024-01-01 10:05:00",
        ] {
            let cast = Value::Str(raw.to_string()).cast(DataType::Timestamp);
            assert_eq!(cast, Value::Timestamp(expected), "raw input {raw:?}");
        }
    }

    #[test]
    fn cast_honours_offsets() {
        let cast = Value::Str("2024-01-01T10:05:00-05:00".to_string()).cast(DataType::Timestamp);
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 15, 5, 0).unwrap();
        assert_eq!(cast, Value::Timestamp(expected));
    }

    #[test]
    fn cast_nulls_unparseable_values() {
        assert_eq!(
            Value::Str("not a time".to_string()).cast(DataType::Timestamp),
            Value::Null
        );
        assert_eq!(
            Value::Str("12.5.3".to_string()).cast(DataType::Float),
            Value::Null
        );
        assert_eq!(Value::Null.cast(DataType::Float), Value::Null);
    }

    #[test]
    fn cast_parses_decimals() {
        assert_eq!(
            Value::Str("99.50".to_string()).cast(DataType::Float),
            Value::Float(99.5)
        );
        assert_eq!(Value::Int(42).cast(DataType::Float), Value::Float(42.0));
    }

    #[test]
    fn render_round_trips_through_csv_conventions() {
        assert_eq!(Value::Null.render(), "");
        assert_eq!(Value::Bool(true).render(), "true");
        assert_eq!(Value::Float(99.5).render(), "99.5");
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 5, 0).unwrap();
        assert_eq!(Value::Timestamp(ts).render(), "2024-01-01T10:05:00Z");
        let list = Value::List(vec![
            Value::Str("checkout".to_string()),
            Value::Str("login".to_string()),
        ]);
        assert_eq!(list.render(), "checkout,login");
    }

    #[test]
    fn compare_is_none_across_kinds() {
        assert_eq!(
            Value::Str("a".to_string()).compare(&Value::Int(1)),
            None
        );
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(
            Value::Int(2).compare(&Value::Float(1.5)),
            Some(Ordering::Greater)
        );
    }
}
