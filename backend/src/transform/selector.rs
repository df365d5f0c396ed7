//! Suffix key selection.
//!
//! Narrows wide records down to the columns of one metric. A record keeps
//! its `Year` and `School Name` plus every `category + suffix` column for a
//! target category, renamed to the bare category:
//!
//! ```text
//! { Year: 2023, "Black|ELA Proficient %": 0.41, "Black|ELA Total Tested": 40 }
//!   --suffix "|ELA Proficient %"-->
//! { Year: 2023, Black: 0.41 }
//! ```
//!
//! A suppressed cell under a matching column is kept as
//! [`Value::Suppressed`] so the suppression reaches the pivot and the notes
//! instead of vanishing.

use serde::Serialize;

use crate::models::{ColumnKey, Record, Value, SCHOOL_NAME, YEAR};

/// Keys kept on every selected record.
pub const PASSTHROUGH: [&str; 2] = [YEAR, SCHOOL_NAME];

/// A filtered record and the categories it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedRecord {
    pub record: Record,
    /// Categories with a reported value.
    pub matched: Vec<String>,
    /// Categories whose value was withheld by the source.
    pub suppressed: Vec<String>,
}

impl SelectedRecord {
    /// Only the passthrough keys carry data.
    pub fn is_insufficient(&self) -> bool {
        self.matched.is_empty()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.matched.iter().any(|c| c == category)
    }

    /// Copy without the given categories.
    pub fn without_categories(&self, categories: &[String]) -> Self {
        let keep = |c: &String| !categories.contains(c);
        Self {
            record: self
                .record
                .without(categories.iter().map(String::as_str)),
            matched: self.matched.iter().filter(|c| keep(c)).cloned().collect(),
            suppressed: self.suppressed.iter().filter(|c| keep(c)).cloned().collect(),
        }
    }
}

/// Output of [`select_by_suffix`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub records: Vec<SelectedRecord>,
    /// Categories observed across all records, in target order.
    pub columns: Vec<String>,
}

impl Selection {
    /// Plain records, for the pivot and for output.
    pub fn to_records(&self) -> Vec<Record> {
        self.records.iter().map(|s| s.record.clone()).collect()
    }

    /// Rebuild the columns manifest after records changed.
    pub fn refresh_columns(&mut self, categories: &[String]) {
        self.columns = columns_manifest(&self.records, categories);
    }
}

/// Keep the `category + suffix` columns of every record, renamed to the
/// bare category, plus the passthrough keys.
pub fn select_by_suffix(records: &[Record], categories: &[String], suffix: &str) -> Selection {
    let selected: Vec<SelectedRecord> = records
        .iter()
        .map(|record| select_record(record, categories, suffix))
        .collect();
    let columns = columns_manifest(&selected, categories);

    Selection {
        records: selected,
        columns,
    }
}

fn select_record(record: &Record, categories: &[String], suffix: &str) -> SelectedRecord {
    let mut out = Record::new();
    let mut matched = Vec::new();
    let mut suppressed = Vec::new();

    for (key, value) in record.iter() {
        if PASSTHROUGH.contains(&key) {
            out.insert(key, value.clone());
            continue;
        }

        let Some(category) = matching_category(key, categories, suffix) else {
            continue;
        };

        match value {
            Value::Absent => {}
            Value::Suppressed => {
                out.insert(category, Value::Suppressed);
                suppressed.push(category.to_string());
            }
            other => {
                out.insert(category, other.clone());
                matched.push(category.to_string());
            }
        }
    }

    SelectedRecord {
        record: out,
        matched,
        suppressed,
    }
}

/// Target category of a metric column, if its suffix is `suffix`.
fn matching_category<'a>(key: &str, categories: &'a [String], suffix: &str) -> Option<&'a str> {
    let column = ColumnKey::parse(key)?;
    if column.suffix() != suffix {
        return None;
    }
    categories
        .iter()
        .find(|c| **c == column.category)
        .map(String::as_str)
}

fn columns_manifest(records: &[SelectedRecord], categories: &[String]) -> Vec<String> {
    categories
        .iter()
        .filter(|c| {
            records
                .iter()
                .any(|r| r.matched.contains(c) || r.suppressed.contains(c))
        })
        .cloned()
        .collect()
}
