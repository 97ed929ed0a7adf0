/*!
 * API v1 Routes
 *
 * Defines the staff-facing `/api/v1` routes (scheduling + appointments) and
 * the voice function-call surface, each layered with its own deadline
 * budget from `BookingConfig`.
 */

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{
    cancel_appointment, create_appointment, get_appointment, get_available_slots,
    handle_voice_function_call, list_appointments, transition_appointment, update_appointment,
};
use crate::middleware::deadline::{staff_deadline_middleware, voice_deadline_middleware};
use crate::state::AppState;

/// Create the staff-facing API v1 router, scoped under the `staff_request_deadline_ms` budget.
pub fn create_api_v1_routes(state: AppState) -> Router {
    let scheduling_routes = Router::new().route("/slots", get(get_available_slots));

    let appointment_routes = Router::new()
        .route("/", post(create_appointment).get(list_appointments))
        .route(
            "/{id}",
            get(get_appointment).patch(update_appointment).delete(cancel_appointment),
        )
        .route("/{id}/transition/{status}", post(transition_appointment));

    Router::new()
        .nest("/scheduling", scheduling_routes)
        .nest("/appointments", appointment_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            staff_deadline_middleware,
        ))
        .with_state(state)
}

/// Create the voice function-call router, scoped under the
/// `voice_request_deadline_ms` budget.
pub fn create_voice_routes(state: AppState) -> Router {
    Router::new()
        .route("/functions", post(handle_voice_function_call))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            voice_deadline_middleware,
        ))
        .with_state(state)
}
