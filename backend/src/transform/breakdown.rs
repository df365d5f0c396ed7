//! Proficiency band breakdown.
//!
//! For one school-year, each category's four band counts become shares of
//! the category total:
//!
//! ```text
//! Black|ELA Below Proficiency       10        Below        0.25
//! Black|ELA Approaching Proficiency 10   ->   Approaching  0.25
//! Black|ELA At Proficiency          10        At           0.25
//! Black|ELA Above Proficiency       10        Above        0.25
//! ```
//!
//! Categories whose bands are suppressed, missing, or all zero are listed
//! with their tested count instead.

use serde::Serialize;

use crate::models::column::column_suffix;
use crate::models::{long_year, Metric, Record, Subject, Value};

/// Column labels of the breakdown table, in display order.
pub const BREAKDOWN_COLUMNS: [&str; 5] = [
    "Category",
    "Below Proficiency",
    "Approaching Proficiency",
    "At Proficiency",
    "Above Proficiency",
];

/// Band shares of one category. They sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandShares {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Below Proficiency")]
    pub below: f64,
    #[serde(rename = "Approaching Proficiency")]
    pub approaching: f64,
    #[serde(rename = "At Proficiency")]
    pub at: f64,
    #[serde(rename = "Above Proficiency")]
    pub above: f64,
}

/// A category left out of the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsufficientN {
    pub category: String,
    pub tested: Value,
    /// `"Black (Tested: 12)"`.
    pub note: String,
}

impl InsufficientN {
    fn new(category: &str, tested: Value) -> Self {
        let note = format!("{} (Tested: {})", category, tested);
        Self {
            category: category.to_string(),
            tested,
            note,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub columns: Vec<String>,
    pub rows: Vec<BandShares>,
    pub insufficient: Vec<InsufficientN>,
    pub year: i32,
    /// `"2023-24"` for 2024.
    pub school_year: String,
}

impl Breakdown {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Band shares for every category of `record`.
pub fn aggregate_bands(record: &Record, categories: &[String], subject: Subject, year: i32) -> Breakdown {
    let mut rows = Vec::new();
    let mut insufficient = Vec::new();

    for category in categories {
        // band counts truncate like the calculator's tested counts
        let counts: Option<Vec<f64>> = Metric::BANDS
            .iter()
            .map(|band| {
                let key = format!("{}{}", category, column_suffix(Some(subject), *band));
                record.get(&key).as_count()
            })
            .collect();

        match counts {
            Some(counts) if counts.iter().sum::<f64>() > 0.0 => {
                let total: f64 = counts.iter().sum();
                rows.push(BandShares {
                    category: category.clone(),
                    below: counts[0] / total,
                    approaching: counts[1] / total,
                    at: counts[2] / total,
                    above: counts[3] / total,
                });
            }
            _ => {
                let tested_key = format!(
                    "{}{}",
                    category,
                    column_suffix(Some(subject), Metric::TotalTested)
                );
                insufficient.push(InsufficientN::new(category, record.get(&tested_key).clone()));
            }
        }
    }

    Breakdown {
        columns: BREAKDOWN_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
        insufficient,
        year,
        school_year: long_year(year),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn cats(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_equal_bands() {
        let record = Record::from_json(&json!({
            "Year": 2024,
            "Black|ELA Below Proficiency": 10,
            "Black|ELA Approaching Proficiency": 10,
            "Black|ELA At Proficiency": 10,
            "Black|ELA Above Proficiency": 10,
            "Black|ELA Total Tested": 40
        }))
        .unwrap();

        let breakdown = aggregate_bands(&record, &cats(&["Black"]), Subject::Ela, 2024);

        assert_eq!(
            breakdown.rows,
            vec![BandShares {
                category: "Black".into(),
                below: 0.25,
                approaching: 0.25,
                at: 0.25,
                above: 0.25,
            }]
        );
        assert!(breakdown.insufficient.is_empty());
        assert_eq!(breakdown.school_year, "2023-24");
        assert_eq!(breakdown.columns[0], "Category");
    }

    #[test]
    fn test_suppressed_band_goes_to_insufficient() {
        let record = Record::from_json(&json!({
            "Asian|Math Below Proficiency": "***",
            "Asian|Math Approaching Proficiency": 2,
            "Asian|Math At Proficiency": 1,
            "Asian|Math Above Proficiency": 0,
            "Asian|Math Total Tested": 12,
            "White|Math Below Proficiency": 0,
            "White|Math Approaching Proficiency": 0,
            "White|Math At Proficiency": 0,
            "White|Math Above Proficiency": 0
        }))
        .unwrap();

        let breakdown = aggregate_bands(&record, &cats(&["Asian", "White"]), Subject::Math, 2023);

        assert!(breakdown.is_empty());
        let notes: Vec<&str> = breakdown.insufficient.iter().map(|i| i.note.as_str()).collect();
        assert_eq!(notes, vec!["Asian (Tested: 12)", "White (Tested: ---)"]);
    }

    #[test]
    fn test_fractional_counts_truncate() {
        let record = Record::new()
            .with("Total|ELA Below Proficiency", 10.9)
            .with("Total|ELA Approaching Proficiency", 10.0)
            .with("Total|ELA At Proficiency", 10.2)
            .with("Total|ELA Above Proficiency", 10.0)
            .with("Hispanic|ELA Below Proficiency", 0.4)
            .with("Hispanic|ELA Approaching Proficiency", 0.0)
            .with("Hispanic|ELA At Proficiency", 0.9)
            .with("Hispanic|ELA Above Proficiency", 0.0);

        let breakdown = aggregate_bands(&record, &cats(&["Total", "Hispanic"]), Subject::Ela, 2024);

        assert_eq!(breakdown.rows[0].below, 0.25);
        assert_eq!(breakdown.rows[0].at, 0.25);
        // under one student in every band truncates to nothing
        assert_eq!(breakdown.insufficient[0].category, "Hispanic");
    }

    #[test]
    fn test_serialized_row_uses_band_labels() {
        let row = BandShares {
            category: "Total".into(),
            below: 0.1,
            approaching: 0.2,
            at: 0.3,
            above: 0.4,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Category"], "Total");
        assert_eq!(json["Above Proficiency"], 0.4);
    }

    proptest! {
        #[test]
        fn shares_sum_to_one(bands in prop::array::uniform4(0u32..500)) {
            prop_assume!(bands.iter().any(|b| *b > 0));
            let mut record = Record::new();
            for (band, count) in Metric::BANDS.iter().zip(bands) {
                record.insert(format!("Total|ELA {}", band), count as f64);
            }

            let breakdown = aggregate_bands(&record, &cats(&["Total"]), Subject::Ela, 2024);
            let row = &breakdown.rows[0];
            let sum = row.below + row.approaching + row.at + row.above;
            prop_assert!((sum - 1.0).abs() < 1e-9);
        }
    }
}
