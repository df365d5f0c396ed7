//! High-level reshaping pipelines.
//!
//! Each function takes the records of one request, the target categories,
//! the subject and the dashboard selection, and returns a display-ready
//! structure:
//!
//! ```text
//!                  ┌─> rate column ─> selector ─> pivot ──────────────> info chart
//!                  │                      └─────> availability ───────> analysis chart
//! records + ctx ───┼─> scheme ───────> table builder (year axis) ─────> info table
//!                  │                   table builder (school axis) ───> analysis table
//!                  └─> year ─────────> band aggregator ───────────────> breakdown
//! enrollment ────────> normalizer x2 ─> reconcile ────────────────────> percentages
//! ```
//!
//! Data-quality outcomes (suppressed cells, schools with nothing to show)
//! come back as `status: empty` or as notes. Only a malformed selection is
//! an error.

use serde::Serialize;

use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult, SelectionError};
use crate::models::{PageTab, Record, SelectionContext, Subject, SCHOOL_ID};

use super::availability::{compare, insufficient_note, reconcile_percentages, Availability, PercentageComparison};
use super::breakdown::{aggregate_bands, Breakdown};
use super::percentage::enrollment_percentages;
use super::pivot::{long_to_wide, wide_to_long, NormalizedSeries};
use super::scheme::{resolve_rate_column, resolve_scheme, SuffixScheme};
use super::selector::{select_by_suffix, Selection};
use super::table::{build_category_table, CategoryTable, TableAxis};

// =============================================================================
// Output types
// =============================================================================

/// Whether a result has anything to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStatus {
    Ready,
    Empty,
}

impl OutputStatus {
    fn from_empty(empty: bool) -> Self {
        if empty {
            OutputStatus::Empty
        } else {
            OutputStatus::Ready
        }
    }
}

/// Multi-year chart for one school.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoChart {
    pub status: OutputStatus,
    /// Rate column suffix that was plotted.
    pub suffix: String,
    pub columns: Vec<String>,
    /// One record per year, numeric cells only.
    pub records: Vec<Record>,
    pub series: NormalizedSeries,
}

/// Single-year chart of the selected school against its comparison group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisChart {
    pub status: OutputStatus,
    pub suffix: String,
    pub columns: Vec<String>,
    pub school: Option<Record>,
    /// Every school, the selected one included, in input order.
    pub records: Vec<Record>,
    /// Categories the selected school has no data for.
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOutput {
    pub status: OutputStatus,
    pub scheme: SuffixScheme,
    pub table: CategoryTable,
    /// Categories dropped because the selected school has no ratio.
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownOutput {
    pub status: OutputStatus,
    #[serde(flatten)]
    pub breakdown: Breakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentageOutput {
    pub status: OutputStatus,
    #[serde(flatten)]
    pub comparison: PercentageComparison,
}

// =============================================================================
// Charts
// =============================================================================

/// Time series of a precomputed rate for one school.
pub fn info_chart(
    records: &[Record],
    categories: &[String],
    subject: Subject,
    selection: &SelectionContext,
) -> PipelineResult<InfoChart> {
    ensure_records(records)?;

    let suffix = resolve_rate_column(subject, selection)?.suffix();
    log_info(format!("📈 Info chart: {} over {} records", suffix, records.len()));

    let selected = select_by_suffix(records, categories, &suffix);
    report_suppressed(&selected);

    let series = wide_to_long(&selected.to_records(), &selected.columns);
    if !series.dropped.is_empty() {
        log_warning(format!("No plottable data for: {}", series.dropped.join(", ")));
    }

    let status = OutputStatus::from_empty(series.is_empty());
    match status {
        OutputStatus::Ready => log_success(format!(
            "{} series across {} years",
            series.series.len(),
            series.years.len()
        )),
        OutputStatus::Empty => log_warning("Nothing to chart"),
    }

    Ok(InfoChart {
        status,
        suffix,
        columns: series.series.iter().map(|s| s.category.clone()).collect(),
        records: long_to_wide(&series.series),
        series,
    })
}

/// Selected school next to its comparison schools for one year.
///
/// Categories the school has no data for are removed from every school.
/// When nothing survives the result is empty.
pub fn analysis_chart(
    records: &[Record],
    categories: &[String],
    subject: Subject,
    selection: &SelectionContext,
) -> PipelineResult<AnalysisChart> {
    ensure_records(records)?;

    let suffix = resolve_rate_column(subject, selection)?.suffix();
    let scoped = scope_to_year(records, selection.year);
    let index = school_index(&scoped, selection)?;
    log_info(format!(
        "📊 Analysis chart: {} for school {} against {} schools",
        suffix,
        selection.school_id,
        scoped.len().saturating_sub(1)
    ));

    let selected = select_by_suffix(&scoped, categories, &suffix);
    report_suppressed(&selected);

    let report = compare(&selected.records[index], &selected.records, categories);
    if report.availability == Availability::Insufficient {
        log_warning("Selected school has no data for any category");
        return Ok(AnalysisChart {
            status: OutputStatus::Empty,
            suffix,
            columns: Vec::new(),
            school: None,
            records: Vec::new(),
            note: insufficient_note(&report.missing),
            missing: report.missing,
        });
    }

    if !report.missing.is_empty() {
        log_info_indent(format!("Removed from comparison: {}", report.missing.join(", ")), 1);
    }

    let mut group = Selection {
        records: report.group,
        columns: Vec::new(),
    };
    group.refresh_columns(categories);
    let school = group.records[index].record.clone();

    log_success(format!("{} categories compared", group.columns.len()));

    Ok(AnalysisChart {
        status: OutputStatus::Ready,
        suffix,
        columns: group.columns.clone(),
        school: Some(school),
        records: group.to_records(),
        note: insufficient_note(&report.missing),
        missing: report.missing,
    })
}

// =============================================================================
// Tables
// =============================================================================

/// Dispatch on the selection's page tab.
pub fn table(
    records: &[Record],
    categories: &[String],
    subject: Subject,
    selection: &SelectionContext,
) -> PipelineResult<TableOutput> {
    match selection.page_tab {
        Some(PageTab::Info) => info_table(records, categories, subject, selection),
        Some(PageTab::Analysis) => analysis_table(records, categories, subject, selection),
        _ => Err(SelectionError::MissingDiscriminator("page_tab").into()),
    }
}

/// Category rows by year columns for one school.
pub fn info_table(
    records: &[Record],
    categories: &[String],
    subject: Subject,
    selection: &SelectionContext,
) -> PipelineResult<TableOutput> {
    ensure_records(records)?;

    let scheme = resolve_scheme(subject, selection)?;
    log_info(format!("📋 Info table: {} / {}", scheme.proficient, scheme.tested));

    let table = build_category_table(records, categories, &scheme, TableAxis::Year);
    report_notes(&table);
    if !table.is_empty() && !table.has_ratio() {
        log_warning("Every cell is suppressed");
    }

    Ok(TableOutput {
        status: OutputStatus::from_empty(!table.has_ratio()),
        scheme,
        table,
        missing: Vec::new(),
        note: None,
    })
}

/// Category rows by school columns for one year, restricted to categories
/// the selected school has a value for.
///
/// A category the school reports as `***` stays in the table. When the
/// school has no ratio in any category the result is empty.
pub fn analysis_table(
    records: &[Record],
    categories: &[String],
    subject: Subject,
    selection: &SelectionContext,
) -> PipelineResult<TableOutput> {
    ensure_records(records)?;

    let scheme = resolve_scheme(subject, selection)?;
    let scoped = scope_to_year(records, selection.year);
    let index = school_index(&scoped, selection)?;
    let school = TableAxis::School
        .label(&scoped[index])
        .ok_or_else(|| SelectionError::SchoolNotFound(selection.school_id.clone()))?;
    log_info(format!("📋 Analysis table: {} against {} schools", school, scoped.len().saturating_sub(1)));

    let full = build_category_table(&scoped, categories, &scheme, TableAxis::School);
    report_notes(&full);

    if !full.has_ratio_in(&school) {
        log_warning(format!("{} has insufficient n-size or no data for every category", school));
        return Ok(TableOutput {
            status: OutputStatus::Empty,
            scheme,
            table: full.without_rows(categories),
            note: insufficient_note(categories),
            missing: categories.to_vec(),
        });
    }

    // suppressed cells of the school are kept as ***
    let missing = full.missing_in(&school, categories);
    if !missing.is_empty() {
        log_info_indent(format!("{} has no ratio for: {}", school, missing.join(", ")), 1);
    }
    let table = full.without_rows(&missing);

    Ok(TableOutput {
        status: OutputStatus::from_empty(table.is_empty()),
        scheme,
        table,
        note: insufficient_note(&missing),
        missing,
    })
}

// =============================================================================
// Breakdown & percentages
// =============================================================================

/// Proficiency band shares of the selected year.
pub fn proficiency_breakdown(
    records: &[Record],
    categories: &[String],
    subject: Subject,
    selection: &SelectionContext,
) -> PipelineResult<BreakdownOutput> {
    ensure_records(records)?;

    let year = selection.year.ok_or(SelectionError::MissingYear)?;
    log_info(format!("🧮 Breakdown: {} {}", subject, year));

    let record = records
        .iter()
        .find(|r| r.year() == Some(year) && belongs_to(r, selection));

    let breakdown = match record {
        Some(record) => aggregate_bands(record, categories, subject, year),
        None => {
            log_warning(format!("No record for {}", year));
            aggregate_bands(&Record::new(), categories, subject, year)
        }
    };

    if !breakdown.insufficient.is_empty() {
        log_warning(format!(
            "Insufficient n-size: {}",
            breakdown
                .insufficient
                .iter()
                .map(|i| i.note.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    Ok(BreakdownOutput {
        status: OutputStatus::from_empty(breakdown.is_empty()),
        breakdown,
    })
}

/// Enrollment shares of a school and its comparison group.
pub fn compare_percentages(
    school: &Record,
    comparison: &Record,
    categories: &[String],
    threshold: f64,
) -> PercentageOutput {
    log_info(format!("🧮 Enrollment shares for {} categories", categories.len()));

    let school_shares = enrollment_percentages(school, categories, threshold);
    let comparison_shares = enrollment_percentages(comparison, categories, threshold);
    if !school_shares.unavailable.is_empty() {
        log_warning(format!(
            "No usable count for: {}",
            school_shares.unavailable.join(", ")
        ));
    }

    let reconciled = reconcile_percentages(&school_shares, &comparison_shares, threshold);
    if let Some(note) = &reconciled.note {
        log_info_indent(note.clone(), 1);
    }

    PercentageOutput {
        status: OutputStatus::from_empty(reconciled.school.proportions.is_empty()),
        comparison: reconciled,
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn ensure_records(records: &[Record]) -> PipelineResult<()> {
    if records.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    Ok(())
}

/// Records of `year`. Records without a year are kept.
fn scope_to_year(records: &[Record], year: Option<i32>) -> Vec<Record> {
    records
        .iter()
        .filter(|r| match (year, r.year()) {
            (Some(wanted), Some(found)) => wanted == found,
            _ => true,
        })
        .cloned()
        .collect()
}

fn school_index(records: &[Record], selection: &SelectionContext) -> PipelineResult<usize> {
    records
        .iter()
        .position(|r| r.is_school(&selection.school_id))
        .ok_or_else(|| SelectionError::SchoolNotFound(selection.school_id.clone()).into())
}

/// Single-school inputs often carry no `School ID`; those match any school.
fn belongs_to(record: &Record, selection: &SelectionContext) -> bool {
    selection.school_id.is_empty() || !record.contains(SCHOOL_ID) || record.is_school(&selection.school_id)
}

fn report_suppressed(selection: &Selection) {
    let suppressed: usize = selection.records.iter().map(|r| r.suppressed.len()).sum();
    if suppressed > 0 {
        log_info_indent(format!("{} suppressed cells kept as ***", suppressed), 1);
    }
}

fn report_notes(table: &CategoryTable) {
    let insufficient: usize = table.notes.insufficient.values().map(Vec::len).sum();
    let none_tested: usize = table.notes.none_tested.values().map(Vec::len).sum();
    if insufficient + none_tested > 0 {
        log_info_indent(
            format!("{} insufficient n-size cells, {} untested cells", insufficient, none_tested),
            1,
        );
    }
    log_success(format!("{} rows x {} columns", table.rows.len(), table.columns.len()));
}
