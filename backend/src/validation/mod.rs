//! JSON Schema validation for request payloads.
//!
//! Schemas are embedded at compile time from the `schemas/` directory:
//! - `reshape-request.json`: records, categories, subject and selection
//! - `percentage-request.json`: school and comparison enrollment counts
//!
//! Validation runs on the raw JSON body before it is deserialized, so a
//! bad payload is reported with every schema violation at once instead of
//! the first serde error.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use schoolboard::validation::validate_reshape_request;
//!
//! let body = json!({
//!     "records": [{"Year": 2023, "Black|ELA Proficient %": "***"}],
//!     "categories": ["Black"],
//!     "subject": "ELA",
//!     "selection": {"school_id": 1088, "type_tab": "k8Tab"}
//! });
//! assert!(validate_reshape_request(&body).is_ok());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::ValidationError;

static RESHAPE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/reshape-request.json"))
        .expect("Invalid embedded schema")
});

static PERCENTAGE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/percentage-request.json"))
        .expect("Invalid embedded schema")
});

/// Validate `data` against `schema` (Draft 7).
///
/// Returns every violation, not only the first.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate a chart, table or breakdown request body.
pub fn validate_reshape_request(data: &Value) -> Result<(), ValidationError> {
    validate(&RESHAPE_SCHEMA, data).map_err(|errors| ValidationError::SchemaError { errors })
}

pub fn is_valid_reshape_request(data: &Value) -> bool {
    is_valid(&RESHAPE_SCHEMA, data)
}

/// Validate a percentage comparison request body.
pub fn validate_percentage_request(data: &Value) -> Result<(), ValidationError> {
    validate(&PERCENTAGE_SCHEMA, data).map_err(|errors| ValidationError::SchemaError { errors })
}
