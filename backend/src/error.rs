//! Error types for the Schoolboard reshaping pipeline.
//!
//! The hierarchy mirrors the layers of the crate:
//!
//! - [`ParseError`] - decoding raw CSV/JSON input into records
//! - [`SelectionError`] - malformed selection context
//! - [`ValidationError`] - request payloads that fail schema validation
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Data-quality states (suppressed values, nothing tested, missing
//! categories) are not errors. Components return them as tagged results and
//! the pipeline turns them into notes.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Input Parsing Errors
// =============================================================================

/// Errors while decoding raw records.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode bytes with the detected encoding.
    #[error("Failed to decode input: {0}")]
    EncodingError(String),

    /// Malformed CSV.
    #[error("Invalid CSV at line {line}: {message}")]
    CsvError { line: u64, message: String },

    /// Malformed JSON.
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Input parsed but is not a list of records.
    #[error("Expected an array of objects: {0}")]
    NotRecords(String),

    /// Empty input.
    #[error("Input is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        ParseError::CsvError {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Selection Context Errors
// =============================================================================

/// The selection context cannot resolve a suffix scheme or a target.
///
/// These are programming errors on the caller side: the UI sent a state
/// that is missing a discriminator the pipeline needs.
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    /// `type_tab` is required to pick a tested/proficient pair.
    #[error("Selection is missing the '{0}' discriminator")]
    MissingDiscriminator(&'static str),

    /// School type and subtype do not map to a rate column.
    #[error("No rate column for school type {school_type:?} / subtype {school_subtype:?}")]
    UnsupportedSchoolType {
        school_type: Option<String>,
        school_subtype: Option<String>,
    },

    /// Subject does not exist for the selected school type.
    #[error("Subject '{subject}' is not reported for {context}")]
    UnsupportedSubject { subject: String, context: String },

    /// Year is required for single-year views.
    #[error("Selection has no year")]
    MissingYear,

    /// The selected school is not part of the supplied records.
    #[error("School '{0}' not found in records")]
    SchoolNotFound(String),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors during request payload validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema validation failed.
    #[error("Validation failed: {}", errors.join("; "))]
    SchemaError { errors: Vec<String> },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by the functions in
/// [`crate::transform::pipeline`]. It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Selection context error.
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No records to transform.
    #[error("No records to transform")]
    EmptyInput,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<ValidationError> for ServerError {
    fn from(err: ValidationError) -> Self {
        ServerError::Pipeline(PipelineError::Validation(err))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for selection resolution.
pub type SelectionResult<T> = Result<T, SelectionError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ParseError -> PipelineError
        let parse_err = ParseError::EmptyFile;
        let pipeline_err: PipelineError = parse_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // SelectionError -> PipelineError
        let selection_err = SelectionError::MissingDiscriminator("type_tab");
        let pipeline_err: PipelineError = selection_err.into();
        assert!(pipeline_err.to_string().contains("type_tab"));
    }

    #[test]
    fn test_schema_error_format() {
        let err = ValidationError::SchemaError {
            errors: vec!["records is required".into(), "year must be integer".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("records is required"));
        assert!(msg.contains("; year must be integer"));
    }

    #[test]
    fn test_validation_into_server_error() {
        let err: ServerError = ValidationError::SchemaError { errors: Vec::new() }.into();
        assert!(matches!(
            err,
            ServerError::Pipeline(PipelineError::Validation(_))
        ));
    }
}
