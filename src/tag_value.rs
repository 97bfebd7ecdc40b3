use crate::utils::{parse_leading_f64, parse_leading_i64};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

/// A single tag value as exiftool emits it in `-json` mode.
///
/// Exiftool picks the JSON type per value: most tags are strings, counts and
/// dimensions are numbers, and `-struct`/embedded output produces nested
/// lists and objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Null,
    Flag(bool),
    Number(Number),
    Text(String),
    List(Vec<TagValue>),
    Object(BTreeMap<String, TagValue>),
}

impl TagValue {
    /// String form used by the lenient getters. Text is returned as-is,
    /// `Null` as an empty string and everything else in its JSON form.
    pub fn to_clean_string(&self) -> String {
        match self {
            TagValue::Null => String::new(),
            TagValue::Text(s) => s.clone(),
            TagValue::Flag(b) => b.to_string(),
            TagValue::Number(n) => n.to_string(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }

    /// Integer coercion; `None` when the value has no numeric reading.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TagValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
            TagValue::Text(s) => parse_leading_i64(s),
            _ => None,
        }
    }

    /// Float coercion; `None` when the value has no numeric reading.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Number(n) => n.as_f64(),
            TagValue::Text(s) => parse_leading_f64(s),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_clean_string())
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::Text(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        TagValue::Text(s)
    }
}

impl From<i64> for TagValue {
    fn from(n: i64) -> Self {
        TagValue::Number(n.into())
    }
}
