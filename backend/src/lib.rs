//! # Schoolboard - academic record reshaping
//!
//! Schoolboard turns wide school-year records exported from state
//! accountability data into chart series, proficiency tables, proficiency
//! band breakdowns and enrollment shares for a school dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV / JSON │────▶│   Parser    │────▶│  Transform  │────▶│ Charts and  │
//! │   records   │     │ (typed cells│     │ (scheme +   │     │   tables    │
//! │             │     │  "***")     │     │  pipelines) │     │   (JSON)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Suppressed values (`"***"` in the source) are kept distinct from missing
//! ones all the way through, and end up as notes such as
//! `"Less than .05%: Asian."` or `"Black (Tested: 12)"` rather than zeros.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schoolboard::{info_chart, parse_file_auto, SelectionContext, Subject};
//!
//! let input = parse_file_auto("school.csv")?;
//! let selection = SelectionContext::for_school("1088");
//! let chart = info_chart(&input.records, &["Black".into()], Subject::Ela, &selection)?;
//! println!("{}", serde_json::to_string_pretty(&chart)?);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Typed cells, records, column keys and the selection context
//! - [`parser`] - CSV/JSON parsing with auto-detection
//! - [`transform`] - Reshaping components and pipelines
//! - [`validation`] - Request schema validation
//! - [`config`] - Environment settings
//! - [`api`] - HTTP API server and log stream

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ParseError, PipelineError, PipelineResult, SelectionError, ServerError, ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    long_year, ColumnKey, Metric, Record, SelectionContext, Subject, Value, SENTINEL,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{parse_bytes_auto, parse_file_auto, parse_json_records, InputFormat, ParsedInput};

// =============================================================================
// Re-exports - Pipelines
// =============================================================================

pub use transform::pipeline::{
    analysis_chart, analysis_table, compare_percentages, info_chart, info_table,
    proficiency_breakdown, table, AnalysisChart, BreakdownOutput, InfoChart, OutputStatus,
    PercentageOutput, TableOutput,
};

// =============================================================================
// Re-exports - Configuration & server
// =============================================================================

pub use api::start_server;
pub use config::Settings;
