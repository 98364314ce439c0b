use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use std::fmt;

/// A single field value read out of a record.
///
/// `Empty` marks an absent value (missing key, null, failed accessor) and is
/// kept apart from present-but-falsy values such as `0`, `false` or `""`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Canonical textual form used for filtering, string comparison and export.
    pub fn as_text(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Interprets a text value as an ISO-8601 date or date-time.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Text(s) => parse_iso8601(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Empty)
    }
}

// Shortest representation that round-trips, integers without a fraction.
fn format_number(n: f64) -> String {
    if n == 0.0 {
        // -0 prints as 0
        return "0".to_string();
    }
    format!("{n}")
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn parse_iso8601(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    // Cheap reject before trying any format: ISO strings start with YYYY-
    let bytes = s.as_bytes();
    if bytes.len() < 10 || !bytes[..4].iter().all(u8::is_ascii_digit) || bytes[4] != b'-' {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// One item of the collection a view is built over.
///
/// Fields keep their insertion order, which export relies on for the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Field value, `Empty` if the key is absent.
    pub fn get(&self, key: &str) -> Value {
        self.fields.get(key).cloned().unwrap_or_default()
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbers_print_in_canonical_form() {
        assert_eq!(Value::from(10.0).as_text(), "10");
        assert_eq!(Value::from(1.5).as_text(), "1.5");
        assert_eq!(Value::from(-0.0).as_text(), "0");
        assert_eq!(Value::from(42).as_text(), "42");
    }

    #[test]
    fn empty_is_distinct_from_falsy_values() {
        assert!(Value::Empty.is_empty());
        assert!(!Value::from(0).is_empty());
        assert!(!Value::from(false).is_empty());
        assert!(!Value::from("").is_empty());
        assert_eq!(Value::from(None::<f64>), Value::Empty);
    }

    #[test]
    fn missing_key_reads_as_empty() {
        let r = Record::new().with("name", "Zinc");
        assert_eq!(r.get("name"), Value::from("Zinc"));
        assert_eq!(r.get("price"), Value::Empty);
        assert!(r.field("price").is_none());
    }

    #[test]
    fn record_keeps_insertion_order() {
        let r: Record = [("z", 1), ("a", 2), ("m", 3)].into_iter().collect();
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn iso_dates_are_recognised() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            parse_iso8601("2024-03-05"),
            day.and_hms_opt(0, 0, 0)
        );
        assert_eq!(
            parse_iso8601("2024-03-05T10:20:30Z"),
            day.and_hms_opt(10, 20, 30)
        );
        assert_eq!(
            parse_iso8601("2024-03-05T10:20:30.500"),
            day.and_hms_milli_opt(10, 20, 30, 500)
        );
        assert_eq!(
            parse_iso8601("2024-03-05 10:20:30"),
            day.and_hms_opt(10, 20, 30)
        );
        assert_eq!(parse_iso8601("Capsule"), None);
        assert_eq!(parse_iso8601("2024"), None);
    }
}
