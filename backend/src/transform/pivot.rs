//! Wide/long pivot.
//!
//! Charts want one series per category; the selector produces one record
//! per year. `wide_to_long` reshapes between the two and `long_to_wide`
//! goes back.
//!
//! ```text
//! [{Year: 2022, A: 0.4, B: ***}, {Year: 2023, A: 0.5}]
//!   -> series A: (2022, 0.4), (2023, 0.5)
//!      dropped: [B]
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::{Record, YEAR};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub category: String,
    pub points: Vec<SeriesPoint>,
}

/// Long form of a set of wide records.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSeries {
    pub series: Vec<Series>,
    /// Every year with at least one point, ascending.
    pub years: Vec<i32>,
    /// Requested columns that produced no point at all.
    pub dropped: Vec<String>,
}

impl NormalizedSeries {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// One series per column, keeping only numeric values of records with a
/// year. Columns without any point are listed in `dropped`.
pub fn wide_to_long(records: &[Record], columns: &[String]) -> NormalizedSeries {
    let mut series = Vec::new();
    let mut dropped = Vec::new();
    let mut years = BTreeSet::new();

    for column in columns {
        let points: Vec<SeriesPoint> = records
            .iter()
            .filter_map(|record| {
                let year = record.year()?;
                let value = record.get(column).as_number()?;
                Some(SeriesPoint { year, value })
            })
            .collect();

        if points.is_empty() {
            dropped.push(column.clone());
            continue;
        }

        years.extend(points.iter().map(|p| p.year));
        series.push(Series {
            category: column.clone(),
            points,
        });
    }

    NormalizedSeries {
        series,
        years: years.into_iter().collect(),
        dropped,
    }
}

/// One record per year, ascending, with a field per series present that
/// year.
pub fn long_to_wide(series: &[Series]) -> Vec<Record> {
    let mut by_year: BTreeMap<i32, Record> = BTreeMap::new();

    for s in series {
        for point in &s.points {
            by_year
                .entry(point.year)
                .or_insert_with(|| Record::new().with(YEAR, point.year as f64))
                .insert(s.category.clone(), point.value);
        }
    }

    by_year.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use proptest::prelude::*;

    fn cats(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_wide_to_long() {
        let records = vec![
            Record::new().with(YEAR, 2022.0).with("A", 0.4).with("B", Value::Suppressed),
            Record::new().with(YEAR, 2023.0).with("A", 0.5),
        ];

        let normalized = wide_to_long(&records, &cats(&["A", "B"]));

        assert_eq!(normalized.series.len(), 1);
        assert_eq!(
            normalized.series[0].points,
            vec![
                SeriesPoint { year: 2022, value: 0.4 },
                SeriesPoint { year: 2023, value: 0.5 },
            ]
        );
        assert_eq!(normalized.years, vec![2022, 2023]);
        assert_eq!(normalized.dropped, cats(&["B"]));
    }

    #[test]
    fn test_years_are_union() {
        let records = vec![
            Record::new().with(YEAR, 2021.0).with("A", 0.1),
            Record::new().with(YEAR, 2022.0).with("B", 0.2),
            Record::new().with("A", 0.9),
        ];
        let normalized = wide_to_long(&records, &cats(&["A", "B"]));
        assert_eq!(normalized.years, vec![2021, 2022]);
        // record without a year contributes nothing
        assert_eq!(normalized.series[0].points.len(), 1);
    }

    #[test]
    fn test_long_to_wide_sorts_years() {
        let series = vec![Series {
            category: "A".into(),
            points: vec![
                SeriesPoint { year: 2023, value: 0.5 },
                SeriesPoint { year: 2021, value: 0.3 },
            ],
        }];
        let wide = long_to_wide(&series);
        assert_eq!(wide[0].year(), Some(2021));
        assert_eq!(wide[1].get("A"), &Value::Number(0.5));
    }

    proptest! {
        #[test]
        fn pivot_roundtrip_keeps_numeric_cells(
            cells in prop::collection::btree_map(
                2000i32..2030,
                (prop::option::of(0.0..1.0f64), prop::option::of(0.0..1.0f64)),
                0..8,
            )
        ) {
            let records: Vec<Record> = cells
                .iter()
                .map(|(year, (a, b))| {
                    let mut record = Record::new().with(YEAR, *year as f64);
                    record.insert("A", a.map(Value::Number).unwrap_or(Value::Suppressed));
                    record.insert("B", b.map(Value::Number).unwrap_or(Value::Absent));
                    record
                })
                .collect();

            let normalized = wide_to_long(&records, &cats(&["A", "B"]));
            let wide = long_to_wide(&normalized.series);

            for (year, (a, b)) in &cells {
                let row = wide.iter().find(|r| r.year() == Some(*year));
                match (a, b) {
                    (None, None) => prop_assert!(row.is_none()),
                    _ => {
                        let row = row.unwrap();
                        prop_assert_eq!(row.get("A").as_number(), *a);
                        prop_assert_eq!(row.get("B").as_number(), *b);
                    }
                }
            }
        }
    }
}
