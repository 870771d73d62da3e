//! Appwrite query builder.
//!
//! Appwrite (1.5+) takes each query as a JSON object passed in a repeated
//! `queries[]` URL parameter, e.g.
//! `{"method":"equal","attribute":"userId","values":["abc"]}`.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A single Appwrite query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<Vec<Value>>,
}

impl Query {
    fn new(method: &'static str, attribute: Option<&str>, values: Option<Vec<Value>>) -> Self {
        Self {
            method,
            attribute: attribute.map(str::to_string),
            values,
        }
    }

    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Self::new("equal", Some(attribute), Some(vec![value.into()]))
    }

    /// Substring match on a string attribute.
    pub fn contains(attribute: &str, value: impl Into<Value>) -> Self {
        Self::new("contains", Some(attribute), Some(vec![value.into()]))
    }

    /// Full-text match; needs a fulltext index on the attribute.
    pub fn is_null(attribute: &str) -> Self {
        Self::new("isNull", Some(attribute), None)
    }

    pub fn limit(limit: u32) -> Self {
        Self::new("limit", None, Some(vec![limit.into()]))
    }

    pub fn offset(offset: u32) -> Self {
        Self::new("offset", None, Some(vec![offset.into()]))
    }

    pub fn cursor_after(document_id: &str) -> Self {
        Self::new("cursorAfter", None, Some(vec![document_id.into()]))
    }

    pub fn order_desc(attribute: &str) -> Self {
        Self::new("orderDesc", Some(attribute), None)
    }

    pub fn order_asc(attribute: &str) -> Self {
        Self::new("orderAsc", Some(attribute), None)
    }

    pub fn select(attributes: &[&str]) -> Self {
        Self::new(
            "select",
            None,
            Some(attributes.iter().map(|a| Value::from(*a)).collect()),
        )
    }

    /// Logical OR of nested queries.
    pub fn or(queries: Vec<Query>) -> Self {
        let values = queries
            .into_iter()
            .map(|q| serde_json::to_value(q).unwrap_or(Value::Null))
            .collect();
        Self::new("or", None, Some(values))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
