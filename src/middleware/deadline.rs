/*!
 * Deadline Middleware
 *
 * Attaches a `RequestContext` carrying an absolute completion deadline to
 * every request, and enforces it with `tokio::time::timeout_at`. Staff HTTP
 * calls and voice function-calls get different budgets
 * (`BookingConfig::staff_request_deadline_ms` / `voice_request_deadline_ms`);
 * which one applies is selected by the router, not by inspecting the
 * request, via two thin wrapper functions layered on the respective
 * sub-routers.
 */

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::time::Instant;

use crate::models::RequestContext;
use crate::state::AppState;
use crate::utils::errors::AppError;

async fn with_deadline(mut request: Request<Body>, next: Next, budget_ms: u64) -> Response {
    let deadline = Instant::now() + std::time::Duration::from_millis(budget_ms);
    let ctx = RequestContext::new(deadline);
    tracing::debug!(request_id = %ctx.request_id, budget_ms, "request deadline attached");
    request.extensions_mut().insert(ctx);

    match tokio::time::timeout_at(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(budget_ms, "request exceeded its deadline");
            (StatusCode::GATEWAY_TIMEOUT, axum::Json(serde_json::json!({
                "error": "DEADLINE_EXCEEDED",
                "message": AppError::DeadlineExceeded.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })))
                .into_response()
        }
    }
}

/// Layer for the staff HTTP surface (`BookingConfig::staff_request_deadline_ms`).
pub async fn staff_deadline_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    with_deadline(request, next, state.booking_config.staff_request_deadline_ms).await
}

/// Layer for the voice function-call surface (`BookingConfig::voice_request_deadline_ms`).
pub async fn voice_deadline_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    with_deadline(request, next, state.booking_config.voice_request_deadline_ms).await
}
