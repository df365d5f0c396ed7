//! Domain models for the reshaping pipeline.
//!
//! - [`Value`] - a single cell: number, suppressed marker, absent, or text
//! - [`Record`] - one school-year (or school) observation, column order preserved
//! - [`ColumnKey`] - typed `"<Category>|<Subject> <Metric>"` column name
//! - [`SelectionContext`] - UI state used to pick a suffix scheme
//!
//! Raw input is converted into these types once, at the parsing boundary.
//! Past that point no component compares against the `"***"` string or uses
//! NaN self-inequality to detect missing data.

pub mod column;
pub mod selection;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::ParseError;

pub use column::{ColumnKey, Metric, Subject};
pub use selection::{HsTab, K8Tab, PageTab, SchoolSubtype, SchoolType, SelectionContext, TypeTab};

/// Marker the upstream source writes when a value is withheld for small n-size.
pub const SENTINEL: &str = "***";

/// Passthrough key holding the school year.
pub const YEAR: &str = "Year";
/// Passthrough key holding the school name.
pub const SCHOOL_NAME: &str = "School Name";
/// Bare key holding the school identifier.
pub const SCHOOL_ID: &str = "School ID";
/// Bare key holding the enrollment denominator.
pub const TOTAL_ENROLLMENT: &str = "Total Enrollment";

// =============================================================================
// Value
// =============================================================================

/// A single record cell after boundary parsing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// A finite number.
    Number(f64),
    /// The source withheld the value (insufficient sample size).
    Suppressed,
    /// No value.
    #[default]
    Absent,
    /// Non-numeric text (school names, identifiers).
    Text(String),
}

impl Value {
    /// Parse a raw string cell.
    ///
    /// Empty strings are absent, the sentinel is suppressed, anything that
    /// parses to a finite number is a number, the rest is text.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Absent;
        }
        if trimmed == SENTINEL {
            return Value::Suppressed;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    /// Convert a JSON cell.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Absent,
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_finite() => Value::Number(f),
                _ => Value::Absent,
            },
            serde_json::Value::String(s) => Value::from_raw(s),
            serde_json::Value::Bool(b) => Value::Text(b.to_string()),
            other => Value::Text(other.to_string()),
        }
    }

    /// Convert back to JSON. Suppressed values are written as the sentinel.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Number(n) => number_json(*n),
            Value::Suppressed => serde_json::Value::String(SENTINEL.to_string()),
            Value::Absent => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Numeric view of the cell. `None` for anything that is not a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view truncated toward zero, for head counts.
    ///
    /// Every count the pipeline reads (tested, proficient and band counts)
    /// goes through here, so `12.7` students always count as `12`.
    pub fn as_count(&self) -> Option<f64> {
        self.as_number().map(f64::trunc)
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Value::Suppressed)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Label used when the value serves as a row or column key.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Number(n) => Some(format_number(*n)),
            Value::Text(s) => Some(s.clone()),
            Value::Suppressed | Value::Absent => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Suppressed => write!(f, "{}", SENTINEL),
            Value::Absent => write!(f, "---"),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        if n.is_finite() {
            Value::Number(n)
        } else {
            Value::Absent
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::from_raw(s)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) if is_integral(*n) => serializer.serialize_i64(*n as i64),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Suppressed => serializer.serialize_str(SENTINEL),
            Value::Absent => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from_json(&raw))
    }
}

fn is_integral(n: f64) -> bool {
    n.fract() == 0.0 && n.abs() < 9.0e15
}

fn format_number(n: f64) -> String {
    if is_integral(n) {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn number_json(n: f64) -> serde_json::Value {
    if is_integral(n) {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

// =============================================================================
// Record
// =============================================================================

static ABSENT: Value = Value::Absent;

/// One observation: field name to value, in source column order.
///
/// Records handed to the pipeline are never modified; every stage builds new
/// records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a JSON object into a record.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ParseError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ParseError::NotRecords(format!("found {}", json_kind(value))))?;
        Ok(obj
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_json(v)))
            .collect())
    }

    /// Encode as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Value for `key`, [`Value::Absent`] when the field does not exist.
    pub fn get(&self, key: &str) -> &Value {
        self.fields.get(key).unwrap_or(&ABSENT)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// New record without the given keys.
    pub fn without<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Self {
        let drop: Vec<&str> = keys.into_iter().collect();
        self.fields
            .iter()
            .filter(|(k, _)| !drop.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// School year of the observation.
    pub fn year(&self) -> Option<i32> {
        match self.get(YEAR) {
            Value::Number(n) if n.fract() == 0.0 => Some(*n as i32),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn school_name(&self) -> Option<&str> {
        match self.get(SCHOOL_NAME) {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Whether this record belongs to the school with identifier `id`.
    ///
    /// Identifiers arrive as numbers or strings depending on the source.
    pub fn is_school(&self, id: &str) -> bool {
        self.get(SCHOOL_ID)
            .label()
            .is_some_and(|label| label == id.trim())
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

/// Convert a four digit year to the school-year label (`2024` -> `2023-24`).
pub fn long_year(year: i32) -> String {
    format!("{}-{:02}", year.saturating_sub(1), year.rem_euclid(100))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
