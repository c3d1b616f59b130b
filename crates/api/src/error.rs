use adder_core::error::CoreError;
use adder_pipeline::orchestrator::PipelineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `adder_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The job could not be built or submitted.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The job was accepted but produced no retrievable output.
    #[error("No result available for job {job_id}")]
    ResultUnavailable {
        job_id: String,
        warnings: Vec<String>,
    },
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }

            AppError::Pipeline(PipelineError::JobConstruction(err)) => {
                tracing::error!(error = %err, "Job construction error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Pipeline(PipelineError::Submission(err)) => {
                tracing::error!(error = %err, "Job submission error");
                (
                    StatusCode::BAD_GATEWAY,
                    "SUBMISSION_FAILED",
                    "The compute network did not accept the job".to_string(),
                )
            }

            AppError::ResultUnavailable { job_id, warnings } => {
                let body = json!({
                    "error": format!("No result available for job {job_id}"),
                    "code": "RESULT_UNAVAILABLE",
                    "warnings": warnings,
                });
                return (StatusCode::BAD_GATEWAY, axum::Json(body)).into_response();
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
