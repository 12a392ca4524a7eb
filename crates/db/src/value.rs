// crates/db/src/value.rs
//! Bound parameter values shared by every backend.

use serde::{Deserialize, Serialize};

/// A single positional parameter for a prepared statement.
///
/// User input only ever reaches SQL through this type; it is never formatted
/// into statement text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    /// Parse a request string as a number, preferring an integer binding.
    ///
    /// Returns `None` when the text is not numeric at all.
    pub fn parse_number(raw: &str) -> Option<Self> {
        if let Ok(i) = raw.parse::<i64>() {
            return Some(Self::Integer(i));
        }
        match raw.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(Self::Real(f)),
            _ => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}
