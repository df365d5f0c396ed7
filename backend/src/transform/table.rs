//! Category table builder.
//!
//! Turns per-year (or per-school) records into one row per category with a
//! proficiency cell per column:
//!
//! ```text
//!            2022                 2023
//! Black      0.41 (n=40)          ***
//! Asian      0.70 (n=20)          0.65 (n=23)
//! ```
//!
//! Cells the calculator could not fill are reported in [`TableNotes`]
//! instead of being dropped silently.

use indexmap::IndexMap;
use serde::Serialize;

use crate::models::Record;

use super::proficiency::{calculate_category, Proficiency};
use super::scheme::SuffixScheme;

/// Which field of a record names its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TableAxis {
    /// One column per year, for a single school.
    Year,
    /// One column per school, for a single year.
    School,
}

impl TableAxis {
    pub fn label(&self, record: &Record) -> Option<String> {
        match self {
            TableAxis::Year => record.year().map(|y| y.to_string()),
            TableAxis::School => record.school_name().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TableCell {
    #[serde(rename_all = "camelCase")]
    Ratio { ratio: f64, sample_size: u64 },
    Suppressed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub category: String,
    pub cells: IndexMap<String, TableCell>,
}

impl TableRow {
    pub fn ratio(&self, column: &str) -> Option<f64> {
        match self.cells.get(column)? {
            TableCell::Ratio { ratio, .. } => Some(*ratio),
            TableCell::Suppressed => None,
        }
    }

    pub fn has_ratio(&self) -> bool {
        self.cells
            .values()
            .any(|cell| matches!(cell, TableCell::Ratio { .. }))
    }
}

/// Cells that could not be computed, by category then column label.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableNotes {
    pub insufficient: IndexMap<String, Vec<String>>,
    pub none_tested: IndexMap<String, Vec<String>>,
}

impl TableNotes {
    pub fn is_empty(&self) -> bool {
        self.insufficient.is_empty() && self.none_tested.is_empty()
    }

    fn record(map: &mut IndexMap<String, Vec<String>>, category: &str, column: &str) {
        map.entry(category.to_string())
            .or_default()
            .push(column.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTable {
    pub axis: TableAxis,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub notes: TableNotes,
}

impl CategoryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, category: &str) -> Option<&TableRow> {
        self.rows.iter().find(|row| row.category == category)
    }

    /// At least one cell of the table is a ratio. A table of `***` cells
    /// only has nothing to show.
    pub fn has_ratio(&self) -> bool {
        self.rows.iter().any(TableRow::has_ratio)
    }

    /// Whether `column` holds a ratio for at least one category.
    pub fn has_ratio_in(&self, column: &str) -> bool {
        self.rows.iter().any(|row| row.ratio(column).is_some())
    }

    /// Categories with no cell at all in `column`. A suppressed cell counts
    /// as present.
    pub fn missing_in(&self, column: &str, categories: &[String]) -> Vec<String> {
        categories
            .iter()
            .filter(|c| {
                self.row(c)
                    .map_or(true, |row| !row.cells.contains_key(column))
            })
            .cloned()
            .collect()
    }

    /// Copy without the rows of `categories`. Notes are kept.
    pub fn without_rows(&self, categories: &[String]) -> Self {
        let rows: Vec<TableRow> = self
            .rows
            .iter()
            .filter(|row| !categories.contains(&row.category))
            .cloned()
            .collect();
        Self {
            axis: self.axis,
            columns: surviving_columns(&self.columns, &rows),
            rows,
            notes: self.notes.clone(),
        }
    }
}

/// Build the category x column proficiency table.
///
/// Records without a label for `axis` are skipped. Suppressed cells stay in
/// the table as `***` and are also noted. Untested cells are only noted, so
/// a category that nobody sat has no row.
pub fn build_category_table(
    records: &[Record],
    categories: &[String],
    scheme: &SuffixScheme,
    axis: TableAxis,
) -> CategoryTable {
    let labelled: Vec<(String, &Record)> = records
        .iter()
        .filter_map(|record| axis.label(record).map(|label| (label, record)))
        .collect();

    let mut notes = TableNotes::default();
    let mut rows = Vec::new();

    for category in categories {
        let mut cells = IndexMap::new();

        for (label, record) in &labelled {
            match calculate_category(record, category, scheme) {
                Proficiency::Ratio { ratio, sample_size } => {
                    cells.insert(label.clone(), TableCell::Ratio { ratio, sample_size });
                }
                Proficiency::Suppressed => {
                    cells.insert(label.clone(), TableCell::Suppressed);
                    TableNotes::record(&mut notes.insufficient, category, label);
                }
                Proficiency::NoneTested => {
                    TableNotes::record(&mut notes.none_tested, category, label);
                }
            }
        }

        let row = TableRow {
            category: category.clone(),
            cells,
        };
        if !row.cells.is_empty() {
            rows.push(row);
        }
    }

    let mut all_columns: Vec<String> = Vec::new();
    for (label, _) in &labelled {
        if !all_columns.contains(label) {
            all_columns.push(label.clone());
        }
    }

    CategoryTable {
        axis,
        columns: surviving_columns(&all_columns, &rows),
        rows,
        notes,
    }
}

fn surviving_columns(columns: &[String], rows: &[TableRow]) -> Vec<String> {
    columns
        .iter()
        .filter(|c| rows.iter().any(|row| row.cells.contains_key(c.as_str())))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metric, Subject};
    use serde_json::json;

    fn ela() -> SuffixScheme {
        SuffixScheme {
            subject: Some(Subject::Ela),
            tested: Metric::TotalTested,
            proficient: Metric::TotalProficient,
        }
    }

    fn cats(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    fn records() -> Vec<Record> {
        vec![
            Record::from_json(&json!({
                "Year": 2022,
                "School Name": "Oak Hill",
                "Black|ELA Total Tested": 40,
                "Black|ELA Total Proficient": 10,
                "Asian|ELA Total Tested": 0,
                "Asian|ELA Total Proficient": 0
            }))
            .unwrap(),
            Record::from_json(&json!({
                "Year": 2023,
                "School Name": "Oak Hill",
                "Black|ELA Total Tested": "***",
                "Black|ELA Total Proficient": "***",
                "Asian|ELA Total Tested": 0
            }))
            .unwrap(),
        ]
    }

    #[test]
    fn test_rows_and_notes() {
        let table = build_category_table(&records(), &cats(&["Black", "Asian"]), &ela(), TableAxis::Year);

        assert_eq!(table.rows.len(), 1);
        let black = table.row("Black").unwrap();
        assert_eq!(
            black.cells.get("2022"),
            Some(&TableCell::Ratio {
                ratio: 0.25,
                sample_size: 40
            })
        );
        assert_eq!(black.cells.get("2023"), Some(&TableCell::Suppressed));
        assert_eq!(table.columns, cats(&["2022", "2023"]));

        assert_eq!(table.notes.insufficient.get("Black"), Some(&cats(&["2023"])));
        assert_eq!(
            table.notes.none_tested.get("Asian"),
            Some(&cats(&["2022", "2023"]))
        );
        // untested category has no row
        assert!(table.row("Asian").is_none());
    }

    #[test]
    fn test_school_axis() {
        let records = vec![
            Record::from_json(&json!({
                "School Name": "Oak Hill",
                "Total|ELA Total Tested": 50,
                "Total|ELA Total Proficient": 25
            }))
            .unwrap(),
            Record::from_json(&json!({
                "School Name": "Elm",
                "Total|ELA Total Tested": 10,
                "Total|ELA Total Proficient": 9
            }))
            .unwrap(),
        ];
        let table = build_category_table(&records, &cats(&["Total"]), &ela(), TableAxis::School);
        assert_eq!(table.columns, cats(&["Oak Hill", "Elm"]));
        assert_eq!(table.rows[0].ratio("Elm"), Some(0.9));
    }

    #[test]
    fn test_missing_in_and_without_rows() {
        let table = build_category_table(&records(), &cats(&["Black", "Asian"]), &ela(), TableAxis::Year);
        // a suppressed cell is not missing
        assert_eq!(table.missing_in("2023", &cats(&["Black", "Asian"])), cats(&["Asian"]));
        assert_eq!(table.missing_in("2022", &cats(&["Black", "Asian"])), cats(&["Asian"]));
        assert_eq!(table.missing_in("2024", &cats(&["Black"])), cats(&["Black"]));

        let trimmed = table.without_rows(&cats(&["Black"]));
        assert!(trimmed.is_empty());
        assert!(trimmed.columns.is_empty());
    }

    #[test]
    fn test_suppressed_only_row_is_kept() {
        let records = vec![
            Record::from_json(&json!({
                "Year": 2022,
                "Total|ELA Total Proficient": 10, "Total|ELA Total Tested": 40,
                "Black|ELA Total Proficient": "***", "Black|ELA Total Tested": 8
            }))
            .unwrap(),
            Record::from_json(&json!({
                "Year": 2023,
                "Total|ELA Total Proficient": 12, "Total|ELA Total Tested": 40,
                "Black|ELA Total Proficient": "***", "Black|ELA Total Tested": 7
            }))
            .unwrap(),
        ];
        let table = build_category_table(&records, &cats(&["Total", "Black"]), &ela(), TableAxis::Year);

        let black = table.row("Black").unwrap();
        assert!(!black.has_ratio());
        assert_eq!(black.cells.get("2022"), Some(&TableCell::Suppressed));
        assert_eq!(black.cells.get("2023"), Some(&TableCell::Suppressed));
        assert_eq!(table.notes.insufficient.get("Black"), Some(&cats(&["2022", "2023"])));
        assert!(table.has_ratio());
    }

    #[test]
    fn test_all_suppressed_table_has_no_ratio() {
        let records = vec![Record::from_json(&json!({
            "Year": 2023,
            "Black|ELA Total Proficient": "***",
            "Black|ELA Total Tested": "***"
        }))
        .unwrap()];
        let table = build_category_table(&records, &cats(&["Black"]), &ela(), TableAxis::Year);

        assert!(!table.is_empty());
        assert!(!table.has_ratio());
        assert!(!table.has_ratio_in("2023"));
    }

    #[test]
    fn test_empty_input() {
        let table = build_category_table(&[], &cats(&["Black"]), &ela(), TableAxis::Year);
        assert!(table.is_empty());
        assert!(table.notes.is_empty());
    }
}
