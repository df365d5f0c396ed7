//! Data availability comparator.
//!
//! Before a school is drawn next to its comparison group, any category the
//! school has no data for is removed from the group as well, so the chart
//! never shows a bar the school cannot be compared against.

use serde::Serialize;

use super::percentage::{threshold_label, PercentageResult};
use super::selector::SelectedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Availability {
    Sufficient,
    /// The school itself has no data in any target category.
    Insufficient,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub availability: Availability,
    /// Target categories the school has no data for.
    pub missing: Vec<String>,
    /// Comparison records with the missing categories removed.
    pub group: Vec<SelectedRecord>,
}

/// Compare the school's categories against the target list.
pub fn compare(
    entity: &SelectedRecord,
    group: &[SelectedRecord],
    categories: &[String],
) -> AvailabilityReport {
    if entity.is_insufficient() {
        return AvailabilityReport {
            availability: Availability::Insufficient,
            missing: categories.to_vec(),
            group: Vec::new(),
        };
    }

    let missing: Vec<String> = categories
        .iter()
        .filter(|c| !entity.has_category(c))
        .cloned()
        .collect();

    AvailabilityReport {
        availability: Availability::Sufficient,
        group: group
            .iter()
            .map(|record| record.without_categories(&missing))
            .collect(),
        missing,
    }
}

/// School and comparison shares after reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentageComparison {
    pub school: PercentageResult,
    pub comparison: PercentageResult,
    /// Display note for the school's below-threshold categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Remove the school's below-threshold categories from the comparison and
/// turn them into a note.
///
/// The school's `missing` list moves into the note. The comparison's own
/// below-threshold list is dropped.
pub fn reconcile_percentages(
    school: &PercentageResult,
    comparison: &PercentageResult,
    threshold: f64,
) -> PercentageComparison {
    let note = threshold_note(&school.missing, threshold);
    let hidden: Vec<String> = school
        .missing
        .iter()
        .chain(school.unavailable.iter())
        .cloned()
        .collect();

    PercentageComparison {
        school: PercentageResult {
            missing: Vec::new(),
            ..school.clone()
        },
        comparison: PercentageResult {
            missing: Vec::new(),
            ..comparison.without_categories(&hidden)
        },
        note,
    }
}

/// `"Less than .05%: Asian, White."`
pub fn threshold_note(missing: &[String], threshold: f64) -> Option<String> {
    if missing.is_empty() {
        return None;
    }
    Some(format!(
        "Less than {}: {}.",
        threshold_label(threshold),
        missing.join(", ")
    ))
}

/// Note for categories the school has no data for.
pub fn insufficient_note(missing: &[String]) -> Option<String> {
    if missing.is_empty() {
        return None;
    }
    Some(format!(
        "Insufficient n-size or no data: {}.",
        missing.join(", ")
    ))
}
