//! Enrollment percentage normalizer.
//!
//! Divides category head counts by a denominator. Categories whose share is
//! below the threshold are not reported as numbers; they are listed under
//! `Missing` so the display can say "less than X%" instead of showing zero.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::models::{Record, TOTAL_ENROLLMENT};

/// Reserved output key listing below-threshold categories.
pub const MISSING_KEY: &str = "Missing";
/// Reserved output key listing categories without a usable count.
pub const UNAVAILABLE_KEY: &str = "Unavailable";

/// Shares for the target categories of one record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PercentageResult {
    /// Category to share of the denominator, in record order.
    pub proportions: IndexMap<String, f64>,
    /// Categories below the threshold.
    pub missing: Vec<String>,
    /// Target categories whose count was suppressed or not a number.
    pub unavailable: Vec<String>,
    /// Non-target fields, minus the denominator.
    pub passthrough: Record,
}

impl PercentageResult {
    /// Drop `categories` from every part of the result.
    pub fn without_categories(&self, categories: &[String]) -> Self {
        Self {
            proportions: self
                .proportions
                .iter()
                .filter(|(c, _)| !categories.contains(c))
                .map(|(c, p)| (c.clone(), *p))
                .collect(),
            missing: retain_others(&self.missing, categories),
            unavailable: retain_others(&self.unavailable, categories),
            passthrough: self.passthrough.clone(),
        }
    }
}

impl Serialize for PercentageResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in self.passthrough.iter() {
            map.serialize_entry(key, value)?;
        }
        for (category, share) in &self.proportions {
            map.serialize_entry(category, share)?;
        }
        if !self.missing.is_empty() {
            map.serialize_entry(MISSING_KEY, &self.missing)?;
        }
        if !self.unavailable.is_empty() {
            map.serialize_entry(UNAVAILABLE_KEY, &self.unavailable)?;
        }
        map.end()
    }
}

/// Divide each target count in `counts` by the `denominator` field of the
/// same record.
///
/// A share strictly below `threshold` goes to `missing`. The denominator
/// field never appears in the output. When it is not a positive number
/// every target count is unavailable.
pub fn find_percentages(
    counts: &Record,
    categories: &[String],
    denominator: &str,
    threshold: f64,
) -> PercentageResult {
    let mut result = PercentageResult::default();
    let total = counts
        .get(denominator)
        .as_number()
        .filter(|n| n.is_finite() && *n > 0.0);

    for (key, value) in counts.iter() {
        if key == denominator {
            continue;
        }
        if !categories.iter().any(|c| c == key) {
            result.passthrough.insert(key, value.clone());
            continue;
        }

        match (value.as_number(), total) {
            (Some(count), Some(total)) => {
                let share = count / total;
                if share < threshold {
                    result.missing.push(key.to_string());
                } else {
                    result.proportions.insert(key.to_string(), share);
                }
            }
            _ => result.unavailable.push(key.to_string()),
        }
    }

    result
}

/// [`find_percentages`] over `Total Enrollment`.
pub fn enrollment_percentages(record: &Record, categories: &[String], threshold: f64) -> PercentageResult {
    find_percentages(record, categories, TOTAL_ENROLLMENT, threshold)
}

/// Render a threshold as a percent label: `0.0005` -> `".05%"`.
pub fn threshold_label(threshold: f64) -> String {
    let formatted = format!("{:.4}", threshold * 100.0);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    let trimmed = trimmed.strip_prefix('0').unwrap_or(trimmed);
    if trimmed.is_empty() {
        "0%".to_string()
    } else {
        format!("{}%", trimmed)
    }
}

fn retain_others(list: &[String], drop: &[String]) -> Vec<String> {
    list.iter().filter(|c| !drop.contains(c)).cloned().collect()
}
