//! Scalar literal values accepted by filters and set expressions.

use crate::escape::quote_literal;
use chrono::{DateTime, SecondsFormat, Utc};

/// A scalar value destined for generated SQL text.
///
/// Numbers are emitted unquoted, text goes through the literal escaper and
/// timestamps are serialized with a fixed ISO-8601 millisecond format before
/// escaping. `Null` always renders as the SQL keyword `NULL`, never as the
/// string `'null'`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Render this value as a SQL literal.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) if f.is_finite() => f.to_string(),
            // Rust formats non-finite floats as `NaN`/`inf`, which Postgres
            // does not parse; it wants the quoted spellings.
            Value::Float(f) if f.is_nan() => "'NaN'::float8".to_string(),
            Value::Float(f) => if f.is_sign_positive() {
                "'Infinity'::float8"
            } else {
                "'-Infinity'::float8"
            }
            .to_string(),
            Value::Text(s) => quote_literal(s),
            Value::Timestamp(ts) => quote_literal(&format_timestamp(ts)),
        }
    }

    /// Render this value for a SET assignment.
    ///
    /// Same as [`Value::to_literal`] except empty text collapses to `NULL`,
    /// which is how restore clears `deleted_at`/`deleted_by`.
    pub fn to_set_literal(&self) -> String {
        match self {
            Value::Text(s) if s.is_empty() => "NULL".to_string(),
            other => other.to_literal(),
        }
    }

    /// Whether this value is the SQL null marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Case-insensitive match against the special `"is null"` /
    /// `"is not null"` filter strings. Returns `Some(negated)`.
    pub(crate) fn null_test(&self) -> Option<bool> {
        let Value::Text(s) = self else { return None };
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "is null" => Some(false),
            "is not null" => Some(true),
            _ => None,
        }
    }
}

/// Fixed timestamp serialization used for audit columns and literals.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn null_renders_as_keyword() {
        assert_eq!(Value::Null.to_literal(), "NULL");
        assert_eq!(Value::from(None::<i64>).to_literal(), "NULL");
    }

    #[test]
    fn numbers_are_unquoted() {
        assert_eq!(Value::from(42i64).to_literal(), "42");
        assert_eq!(Value::from(2.5f64).to_literal(), "2.5");
    }

    #[test]
    fn non_finite_floats_use_quoted_spellings() {
        assert_eq!(Value::from(f64::NAN).to_literal(), "'NaN'::float8");
        assert_eq!(
            Value::from(f64::INFINITY).to_literal(),
            "'Infinity'::float8"
        );
        assert_eq!(
            Value::from(f64::NEG_INFINITY).to_literal(),
            "'-Infinity'::float8"
        );
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(Value::from("o'neil").to_literal(), "'o''neil'");
    }

    #[test]
    fn timestamp_uses_fixed_format() {
        let ts = Utc.with_ymd_and_hms(2018, 9, 11, 4, 44, 36).unwrap();
        assert_eq!(
            Value::from(ts).to_literal(),
            "'2018-09-11T04:44:36.000Z'"
        );
    }

    #[test]
    fn empty_text_becomes_null_in_set_position() {
        assert_eq!(Value::from("").to_set_literal(), "NULL");
        assert_eq!(Value::from("").to_literal(), "''");
    }

    #[test]
    fn null_test_is_case_insensitive() {
        assert_eq!(Value::from("IS NULL").null_test(), Some(false));
        assert_eq!(Value::from("is not null").null_test(), Some(true));
        assert_eq!(Value::from("null").null_test(), None);
        assert_eq!(Value::Int(1).null_test(), None);
    }
}
