//! Selection context sent by the dashboard.
//!
//! The pipeline only reads this struct. Tab values use the identifiers the UI
//! sends (`"k8Tab"`, `"ireadTab"`, ...); values this crate does not know
//! deserialize to an `Other` variant instead of failing.

use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchoolType {
    K8,
    HS,
    K12,
    AHS,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchoolSubtype {
    K8,
    HS,
    K12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageTab {
    #[serde(rename = "infoTab")]
    Info,
    #[serde(rename = "analysisTab")]
    Analysis,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTab {
    #[serde(rename = "k8Tab")]
    K8,
    #[serde(rename = "hsTab")]
    Hs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum K8Tab {
    #[serde(rename = "ilearnTab")]
    Ilearn,
    #[serde(rename = "ireadTab")]
    Iread,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HsTab {
    #[serde(rename = "gradTab")]
    Graduation,
    #[serde(rename = "satTab")]
    Sat,
    #[serde(other)]
    Other,
}

/// Current dashboard state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionContext {
    /// Selected school. Numbers and strings are both accepted.
    #[serde(default, deserialize_with = "string_or_number")]
    pub school_id: String,
    #[serde(default)]
    pub school_type: Option<SchoolType>,
    #[serde(default)]
    pub school_subtype: Option<SchoolSubtype>,
    #[serde(default)]
    pub page_tab: Option<PageTab>,
    #[serde(default)]
    pub k8_tab: Option<K8Tab>,
    #[serde(default)]
    pub hs_tab: Option<HsTab>,
    #[serde(default)]
    pub type_tab: Option<TypeTab>,
    #[serde(default, deserialize_with = "optional_year")]
    pub year: Option<i32>,
}

impl SelectionContext {
    pub fn for_school(school_id: impl Into<String>) -> Self {
        Self {
            school_id: school_id.into(),
            ..Self::default()
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected school id as string or number, got {}",
            other
        ))),
    }
}

fn optional_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid year {}", n))),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid year '{}'", s))),
        other => Err(de::Error::custom(format!("invalid year {}", other))),
    }
}
