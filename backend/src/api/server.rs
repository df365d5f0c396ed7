//! HTTP server for the Schoolboard API.
//!
//! Every reshaping endpoint takes a JSON body, validates it against the
//! embedded schema, runs one pipeline and answers with the pipeline output
//! plus a `requestId`.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                              |
//! |--------|-----------------------|------------------------------------------|
//! | GET    | `/health`             | Health check                             |
//! | POST   | `/api/chart/info`     | Multi-year rate chart for one school     |
//! | POST   | `/api/chart/analysis` | School vs comparison schools, one year   |
//! | POST   | `/api/table`          | Proficiency table, by `page_tab`         |
//! | POST   | `/api/table/info`     | Category x year proficiency table        |
//! | POST   | `/api/table/analysis` | Category x school proficiency table      |
//! | POST   | `/api/breakdown`      | Proficiency band shares for one year     |
//! | POST   | `/api/percentages`    | Enrollment shares, school vs comparison  |
//! | GET    | `/api/logs`           | SSE stream for real-time logs            |

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, ApiResponse, PercentageRequest, ReshapeRequest};
use crate::config::Settings;
use crate::error::{PipelineError, PipelineResult, ServerError, ServerResult, ValidationError};
use crate::models::{Record, SelectionContext, Subject};
use crate::transform::pipeline::{self, PercentageOutput};
use crate::validation::{validate_percentage_request, validate_reshape_request};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
}

/// Build the application router.
pub fn router(settings: Settings) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let state = AppState {
        settings: Arc::new(settings),
    };

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/chart/info", post(info_chart))
        .route("/api/chart/analysis", post(analysis_chart))
        .route("/api/table", post(table))
        .route("/api/table/info", post(info_table))
        .route("/api/table/analysis", post(analysis_table))
        .route("/api/breakdown", post(breakdown))
        .route("/api/percentages", post(percentages))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let port = settings.port;
    let app = router(settings);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Schoolboard server running on http://localhost:{}", port);
    println!("   POST /api/chart/{{info,analysis}}  - Chart data");
    println!("   POST /api/table[/info,/analysis]  - Proficiency tables");
    println!("   POST /api/breakdown               - Proficiency bands");
    println!("   POST /api/percentages             - Enrollment shares");
    println!("   GET  /api/logs                    - SSE log stream");
    println!("   GET  /health                      - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// Error mapping
// =============================================================================

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(
                PipelineError::Validation(_) | PipelineError::Selection(_) | PipelineError::EmptyInput,
            ) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Parse(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            log_error(self.to_string());
        }

        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "schoolboard",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "charts": "POST /api/chart/{info,analysis}",
            "tables": "POST /api/table, /api/table/{info,analysis}",
            "breakdown": "POST /api/breakdown",
            "percentages": "POST /api/percentages",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // lagged receivers skip the entries they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

type Reshape<T> = fn(&[Record], &[String], Subject, &SelectionContext) -> PipelineResult<T>;

fn reshape<T: Serialize>(body: Value, run: Reshape<T>) -> ServerResult<Json<ApiResponse<T>>> {
    let request: ReshapeRequest = parse_request(body, validate_reshape_request)?;
    let output = run(
        &request.records,
        &request.categories,
        request.subject,
        &request.selection,
    )?;
    Ok(Json(ApiResponse::new(output)))
}

async fn info_chart(Json(body): Json<Value>) -> ServerResult<Json<ApiResponse<pipeline::InfoChart>>> {
    reshape(body, pipeline::info_chart)
}

async fn analysis_chart(
    Json(body): Json<Value>,
) -> ServerResult<Json<ApiResponse<pipeline::AnalysisChart>>> {
    reshape(body, pipeline::analysis_chart)
}

async fn table(Json(body): Json<Value>) -> ServerResult<Json<ApiResponse<pipeline::TableOutput>>> {
    reshape(body, pipeline::table)
}

async fn info_table(Json(body): Json<Value>) -> ServerResult<Json<ApiResponse<pipeline::TableOutput>>> {
    reshape(body, pipeline::info_table)
}

async fn analysis_table(
    Json(body): Json<Value>,
) -> ServerResult<Json<ApiResponse<pipeline::TableOutput>>> {
    reshape(body, pipeline::analysis_table)
}

async fn breakdown(
    Json(body): Json<Value>,
) -> ServerResult<Json<ApiResponse<pipeline::BreakdownOutput>>> {
    reshape(body, pipeline::proficiency_breakdown)
}

async fn percentages(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ServerResult<Json<ApiResponse<PercentageOutput>>> {
    let request: PercentageRequest = parse_request(body, validate_percentage_request)?;
    let threshold = request.threshold.unwrap_or(state.settings.min_proportion);

    let output = pipeline::compare_percentages(
        &request.school,
        &request.comparison,
        &request.categories,
        threshold,
    );
    Ok(Json(ApiResponse::new(output)))
}

/// Validate the raw body, then deserialize it.
fn parse_request<T: DeserializeOwned>(
    body: Value,
    validate: fn(&Value) -> Result<(), ValidationError>,
) -> ServerResult<T> {
    validate(&body)?;
    serde_json::from_value(body).map_err(|e| ServerError::BadRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, SelectionError};

    #[test]
    fn test_status_mapping() {
        let bad: ServerError = PipelineError::Selection(SelectionError::MissingYear).into();
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let invalid: ServerError = ValidationError::SchemaError {
            errors: vec!["\"records\" is a required property".into()],
        }
        .into();
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let internal: ServerError = PipelineError::Parse(ParseError::EmptyFile).into();
        assert_eq!(
            internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_parse_request_rejects_schema_violations() {
        let result: ServerResult<ReshapeRequest> =
            parse_request(json!({"records": "nope"}), validate_reshape_request);
        assert!(matches!(
            result,
            Err(ServerError::Pipeline(PipelineError::Validation(_)))
        ));
    }

    #[test]
    fn test_parse_request_accepts_valid_body() {
        let result: ServerResult<ReshapeRequest> = parse_request(
            json!({
                "records": [{"Year": 2023}],
                "categories": ["Total"],
                "subject": "Math",
                "selection": {"school_id": "12", "type_tab": "k8Tab"}
            }),
            validate_reshape_request,
        );
        assert_eq!(result.unwrap().subject, Subject::Math);
    }

    #[test]
    fn test_router_builds() {
        let _ = router(Settings::default());
    }
}
