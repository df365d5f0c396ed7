//! Reshaping pipeline.
//!
//! - `scheme`: which columns to read for a subject and selection
//! - `selector`: narrow wide records to one metric, renamed to categories
//! - `proficiency`: proficient / tested for one category
//! - `table`: category rows by year or school columns
//! - `percentage`: enrollment shares with a reporting threshold
//! - `pivot`: wide records to per-category series and back
//! - `availability`: align a comparison group with the selected school
//! - `breakdown`: proficiency band shares
//! - `pipeline`: the chart, table, breakdown and percentage entry points

pub mod availability;
pub mod breakdown;
pub mod percentage;
pub mod pipeline;
pub mod pivot;
pub mod proficiency;
pub mod scheme;
pub mod selector;
pub mod table;

pub use availability::{compare, reconcile_percentages, Availability, AvailabilityReport, PercentageComparison};
pub use breakdown::{aggregate_bands, BandShares, Breakdown, InsufficientN};
pub use percentage::{enrollment_percentages, find_percentages, PercentageResult};
pub use pipeline::*;
pub use pivot::{long_to_wide, wide_to_long, NormalizedSeries, Series, SeriesPoint};
pub use proficiency::{calculate, Proficiency};
pub use scheme::{resolve_rate_column, resolve_scheme, RateColumn, SuffixScheme};
pub use selector::{select_by_suffix, SelectedRecord, Selection};
pub use table::{build_category_table, CategoryTable, TableAxis, TableCell, TableNotes, TableRow};
