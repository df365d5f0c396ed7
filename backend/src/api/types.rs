//! REST API request and response types.
//!
//! Request bodies use camelCase at the top level. The `selection` object
//! keeps the snake_case field names the dashboard already sends
//! (`school_id`, `type_tab`, ...).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{Record, SelectionContext, Subject};

/// Body of the chart, table and breakdown endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReshapeRequest {
    pub records: Vec<Record>,
    pub categories: Vec<String>,
    pub subject: Subject,
    pub selection: SelectionContext,
}

/// Body of the percentage endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentageRequest {
    pub school: Record,
    pub comparison: Record,
    pub categories: Vec<String>,
    /// Falls back to the configured minimum proportion.
    #[serde(default)]
    pub threshold: Option<f64>,
}

/// Pipeline output tagged with a request id.
///
/// The output is flattened, so its `status` sits next to `requestId`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub request_id: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            data,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "requestId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TypeTab, Value as Cell};

    #[test]
    fn test_reshape_request_deserializes() {
        let request: ReshapeRequest = serde_json::from_value(json!({
            "records": [{"Year": 2023, "Black|ELA Total Tested": "***"}],
            "categories": ["Black"],
            "subject": "ELA",
            "selection": {"school_id": 1088, "type_tab": "k8Tab"}
        }))
        .unwrap();

        assert_eq!(request.subject, Subject::Ela);
        assert_eq!(request.selection.school_id, "1088");
        assert_eq!(request.selection.type_tab, Some(TypeTab::K8));
        assert_eq!(request.records[0].get("Black|ELA Total Tested"), &Cell::Suppressed);
    }

    #[test]
    fn test_response_flattens_output() {
        let response = ApiResponse::new(json!({"status": "ready", "columns": ["Black"]}));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["columns"][0], "Black");
        assert!(Uuid::parse_str(json["requestId"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_error_response() {
        let json = error_response("School '7' not found in records");
        assert_eq!(json["status"], "error");
        assert!(json["error"].as_str().unwrap().contains("'7'"));
    }
}
