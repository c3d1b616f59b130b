use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Any method other than POST on `/compute` is answered like an unknown
/// path: 404 with a plaintext body.
async fn method_not_supported() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Method is not supported.")
}

/// Mount the compute route.
///
/// ```text
/// POST /compute        run an addition job (form body: x, y)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/compute",
        post(handlers::compute::compute).fallback(method_not_supported),
    )
}
