//! Field value types used for search, filtering, sorting and validation

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::OnceLock;
use uuid::Uuid;

/// A polymorphic field value read from a record column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    List(Vec<String>),
    Null,
}

impl FieldValue {
    /// Build a field value from a serialized column.
    ///
    /// Strings holding a UUID or an RFC 3339 timestamp keep their string form
    /// so that search and exact-match filters behave like the backend does.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FieldValue::String(s.clone()),
            Value::Array(items) => FieldValue::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::Object(_) => FieldValue::String(value.to_string()),
        }
    }

    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float; integers widen
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Exact match against a JSON filter value
    pub fn matches_json(&self, expected: &Value) -> bool {
        match (self, expected) {
            (FieldValue::Null, Value::Null) => true,
            (FieldValue::String(s), Value::String(v)) => s == v,
            (FieldValue::Boolean(b), Value::Bool(v)) => b == v,
            (FieldValue::Uuid(u), Value::String(v)) => u.to_string() == *v,
            (FieldValue::List(items), Value::String(v)) => items.iter().any(|item| item == v),
            (value, Value::Number(n)) => match (value.as_f64(), n.as_f64()) {
                (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
                _ => false,
            },
            _ => false,
        }
    }

    /// Total order used by list sorting. Nulls sort first.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Less,
            (_, FieldValue::Null) => Ordering::Greater,
            (FieldValue::String(a), FieldValue::String(b)) => a.cmp(b),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a.cmp(b),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => a.to_cell().cmp(&b.to_cell()),
            },
        }
    }

    /// Plain-text rendering used for table cells and CSV
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::String(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Uuid(u) => u.to_string(),
            FieldValue::DateTime(d) => d.to_rfc3339(),
            FieldValue::List(items) => items.join(";"),
            FieldValue::Null => String::new(),
        }
    }
}

/// Field format validators
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Email,
    Url,
    Custom(Regex),
}

impl FieldFormat {
    /// Validate a raw string against this format
    pub fn validate(&self, value: &str) -> bool {
        match self {
            FieldFormat::Email => Self::is_valid_email(value),
            FieldFormat::Url => Self::is_valid_url(value),
            FieldFormat::Custom(regex) => regex.is_match(value),
        }
    }

    fn is_valid_email(email: &str) -> bool {
        static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
        EMAIL_REGEX
            .get_or_init(|| {
                Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
                    .expect("email pattern is valid")
            })
            .is_match(email)
    }

    fn is_valid_url(url: &str) -> bool {
        static URL_REGEX: OnceLock<Regex> = OnceLock::new();
        URL_REGEX
            .get_or_init(|| {
                Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url pattern is valid")
            })
            .is_match(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(FieldValue::from_json(&json!(42)), FieldValue::Integer(42));
        assert_eq!(FieldValue::from_json(&json!(4.5)), FieldValue::Float(4.5));
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Null);
    }

    #[test]
    fn test_from_json_list() {
        let value = FieldValue::from_json(&json!(["a", "b"]));
        assert_eq!(value, FieldValue::List(vec!["a".into(), "b".into()]));
        assert_eq!(value.to_cell(), "a;b");
    }

    #[test]
    fn test_matches_json() {
        assert!(FieldValue::String("open".into()).matches_json(&json!("open")));
        assert!(FieldValue::Integer(3).matches_json(&json!(3.0)));
        assert!(FieldValue::Boolean(true).matches_json(&json!(true)));
        assert!(!FieldValue::Boolean(true).matches_json(&json!("true")));
        assert!(FieldValue::List(vec!["vip".into()]).matches_json(&json!("vip")));
    }

    #[test]
    fn test_compare_mixed_numbers() {
        let a = FieldValue::Integer(2);
        let b = FieldValue::Float(2.5);
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(FieldValue::Null.compare(&a), Ordering::Less);
    }

    #[test]
    fn test_email_format() {
        assert!(FieldFormat::Email.validate("billing@acme.com"));
        assert!(!FieldFormat::Email.validate("not-an-email"));
    }

    #[test]
    fn test_url_format() {
        assert!(FieldFormat::Url.validate("https://api.example.com/webhooks"));
        assert!(!FieldFormat::Url.validate("ftp//nope"));
    }
}
