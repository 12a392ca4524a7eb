// crates/db/src/request.rs
//! Structured list request parsed from query strings or JSON bodies.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A request value that could not be accepted. Raised before any SQL is built.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Invalid {field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Case-insensitive `asc` / `desc`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ValidationError::new(
                "sortOrder",
                format!("'{raw}' is not one of: asc, desc"),
            )),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Paging, filters, search and sort for one list call.
///
/// `page` and `page_size` are already coerced: both are at least 1 and
/// `page_size` never exceeds [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub page: u32,
    pub page_size: u32,
    /// Every non-reserved key, trimmed. Keys unknown to a table are ignored
    /// by the builder.
    pub filters: BTreeMap<String, String>,
    pub search: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            filters: BTreeMap::new(),
            search: None,
            sort_field: None,
            sort_direction: SortDirection::default(),
        }
    }
}

impl QueryRequest {
    /// Parse raw key/value pairs (query string or flattened body).
    ///
    /// Values are trimmed and empty ones are treated as absent.
    pub fn from_params<I, K, V>(params: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut req = Self::default();
        for (key, value) in params {
            let key = key.as_ref().trim();
            let value = value.as_ref().trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            match key {
                "page" => req.page = coerce_page(parse_integer("page", value)?),
                "pageSize" | "page_size" => {
                    req.page_size = coerce_page_size(parse_integer("pageSize", value)?)
                }
                "search" | "q" => req.search = Some(value.to_string()),
                "sortBy" | "sort_by" => req.sort_field = Some(value.to_string()),
                "sortOrder" | "sort_order" => req.sort_direction = SortDirection::parse(value)?,
                _ => {
                    req.filters.insert(key.to_string(), value.to_string());
                }
            }
        }
        Ok(req)
    }

    /// Parse a JSON object body. Arrays are joined with commas so they feed
    /// list filters; nested objects are rejected.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, ValidationError> {
        let object = body
            .as_object()
            .ok_or_else(|| ValidationError::new("body", "expected a JSON object"))?;

        let mut pairs = Vec::with_capacity(object.len());
        for (key, value) in object {
            if let Some(text) = scalar_text(key, value)? {
                pairs.push((key.as_str(), text));
            }
        }
        Self::from_params(pairs)
    }

    pub fn with_page(mut self, page: i64, page_size: i64) -> Self {
        self.page = coerce_page(page);
        self.page_size = coerce_page_size(page_size);
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = Some(field.into());
        self.sort_direction = direction;
        self
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

fn parse_integer(field: &str, raw: &str) -> Result<i64, ValidationError> {
    raw.parse::<i64>()
        .map_err(|_| ValidationError::new(field, format!("'{raw}' is not an integer")))
}

pub(crate) fn coerce_page(page: i64) -> u32 {
    if page <= 0 {
        DEFAULT_PAGE
    } else {
        u32::try_from(page).unwrap_or(u32::MAX)
    }
}

pub(crate) fn coerce_page_size(page_size: i64) -> u32 {
    if page_size <= 0 {
        DEFAULT_PAGE_SIZE
    } else if page_size > i64::from(MAX_PAGE_SIZE) {
        MAX_PAGE_SIZE
    } else {
        page_size as u32
    }
}

fn scalar_text(key: &str, value: &serde_json::Value) -> Result<Option<String>, ValidationError> {
    use serde_json::Value;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Array(_) | Value::Object(_) => {
                        return Err(ValidationError::new(key, "nested values are not supported"))
                    }
                    other => parts.extend(scalar_text(key, other)?),
                }
            }
            Some(parts.join(","))
        }
        Value::Object(_) => {
            return Err(ValidationError::new(key, "nested objects are not supported"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_when_absent() {
        let req = QueryRequest::from_params(Vec::<(&str, &str)>::new()).unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, 20);
        assert_eq!(req.sort_direction, SortDirection::Desc);
        assert!(req.filters.is_empty());
    }

    #[test]
    fn test_page_coercion() {
        let req = QueryRequest::from_params([("page", "0"), ("pageSize", "-3")]).unwrap();
        assert_eq!((req.page, req.page_size), (1, 20));

        let req = QueryRequest::from_params([("page", "-9"), ("pageSize", "500")]).unwrap();
        assert_eq!((req.page, req.page_size), (1, 100));

        let req = QueryRequest::from_params([("page", "3"), ("page_size", "15")]).unwrap();
        assert_eq!((req.page, req.page_size), (3, 15));
        assert_eq!(req.offset(), 30);
    }

    #[test]
    fn test_non_integer_page_is_rejected() {
        let err = QueryRequest::from_params([("page", "two")]).unwrap_err();
        assert_eq!(err.field, "page");
        let err = QueryRequest::from_params([("pageSize", "1.5")]).unwrap_err();
        assert_eq!(err.field, "pageSize");
    }

    #[test]
    fn test_values_trimmed_and_empty_dropped() {
        let req = QueryRequest::from_params([
            ("platform", "  YouTube "),
            ("region", "   "),
            ("q", " beast "),
            ("page", ""),
        ])
        .unwrap();
        assert_eq!(req.filter("platform"), Some("YouTube"));
        assert_eq!(req.filter("region"), None);
        assert_eq!(req.search.as_deref(), Some("beast"));
        assert_eq!(req.page, 1);
    }

    #[test]
    fn test_sort_order_validation() {
        let req = QueryRequest::from_params([("sortBy", "platform"), ("sortOrder", "ASC")]).unwrap();
        assert_eq!(req.sort_field.as_deref(), Some("platform"));
        assert_eq!(req.sort_direction, SortDirection::Asc);

        let err = QueryRequest::from_params([("sortOrder", "sideways")]).unwrap_err();
        assert_eq!(err.field, "sortOrder");
    }

    #[test]
    fn test_from_json_body() {
        let req = QueryRequest::from_json(&json!({
            "page": 2,
            "pageSize": 10,
            "regions": ["US", "UK"],
            "minVolume": 1000,
            "language": null,
            "search": "earbuds"
        }))
        .unwrap();
        assert_eq!((req.page, req.page_size), (2, 10));
        assert_eq!(req.filter("regions"), Some("US,UK"));
        assert_eq!(req.filter("minVolume"), Some("1000"));
        assert_eq!(req.filter("language"), None);
        assert_eq!(req.search.as_deref(), Some("earbuds"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(QueryRequest::from_json(&json!([1, 2])).is_err());
        assert!(QueryRequest::from_json(&json!({ "filters": { "a": 1 } })).is_err());
    }
}
