//! Handler for `POST /compute`.
//!
//! Parses the operands, runs the dispatch pipeline and maps its outcome to
//! an HTTP response. The job's `stdout` is returned verbatim as
//! `text/plain`.

use adder_core::operands::Operands;
use adder_pipeline::orchestrator::{ComputeOutcome, PipelineWarning};
use axum::extract::{Form, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use tower_http::request_id::RequestId;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Response header carrying the compute-network job id.
pub const JOB_ID_HEADER: &str = "x-compute-job-id";
/// Response header repeated once per pipeline warning.
pub const WARNING_HEADER: &str = "x-compute-warning";

/// POST /compute
///
/// Form body with `x` and `y`. Returns 200 with the job's output, 400 for
/// invalid operands, 502 when the job could not be submitted or produced
/// nothing retrievable.
pub async fn compute(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let request_id = request_id
        .and_then(|Extension(id)| id.header_value().to_str().ok().map(str::to_owned))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let operands = Operands::from_form_pairs(&pairs).inspect_err(|e| {
        tracing::info!(request_id = %request_id, error = %e, "Rejected compute request");
    })?;

    let outcome = state.pipeline.run(&request_id, operands).await?;
    outcome_response(outcome)
}

/// Map a pipeline outcome to a response.
///
/// Partial results with content are still delivered, flagged through
/// [`WARNING_HEADER`]. Partial results without content are an error.
fn outcome_response(outcome: ComputeOutcome) -> AppResult<Response> {
    match outcome {
        ComputeOutcome::Complete { job_id, content } => Ok(text_response(&job_id, content, &[])),
        ComputeOutcome::Partial {
            job_id,
            content,
            warnings,
        } if !content.is_empty() => Ok(text_response(&job_id, content, &warnings)),
        ComputeOutcome::Partial {
            job_id, warnings, ..
        } => Err(AppError::ResultUnavailable {
            job_id,
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }),
    }
}

fn text_response(job_id: &str, content: Vec<u8>, warnings: &[PipelineWarning]) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(JOB_ID_HEADER, header_value(job_id));
    for warning in warnings {
        headers.append(WARNING_HEADER, header_value(&warning.to_string()));
    }

    (headers, content).into_response()
}

/// Build a header value, replacing anything outside visible ASCII.
fn header_value(text: &str) -> HeaderValue {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { ' ' })
        .collect();
    HeaderValue::from_str(cleaned.trim()).unwrap_or_else(|_| HeaderValue::from_static(""))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
