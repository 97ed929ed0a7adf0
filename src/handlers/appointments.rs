/*!
 * Appointment Management HTTP Handlers
 *
 * Handles HTTP requests for appointment CRUD, rescheduling, cancellation,
 * and lifecycle transitions through the Booking Coordinator. There is no
 * RBAC layer in this core — authorisation of who may call these endpoints
 * is handled upstream (see DESIGN.md).
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    Appointment, AppointmentStatus, CancelAppointmentRequest, CreateAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::services::{CreateAppointmentParams, ReschedulePatch};
use crate::state::AppState;
use crate::utils::{AppError, Result};

/// POST /api/v1/appointments
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let appointment = state
        .coordinator
        .create(CreateAppointmentParams {
            practice_id: req.practice_id,
            vet_id: req.vet_id,
            appointment_at_utc: req.appointment_at_utc,
            duration_minutes: req.duration_minutes,
            pet_ids: req.pet_ids,
            owner_id: req.owner_id,
            title: req.title,
            notes: req.notes,
            created_by_user_id: req.created_by_user_id,
            emergency_override: req.emergency_override,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

/// GET /api/v1/appointments/{id}
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let appointment = state.store.fetch_appointment(id).await?;
    Ok(Json(appointment))
}

/// PATCH /api/v1/appointments/{id}
///
/// Reschedules fields present in the body; absent fields keep their current
/// value. A `status` present in the body is applied as a separate lifecycle
/// transition after any reschedule.
pub async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAppointmentRequest>,
) -> Result<impl IntoResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut appointment = state
        .coordinator
        .reschedule(
            id,
            ReschedulePatch {
                new_at_utc: req.appointment_at_utc,
                new_duration_minutes: req.duration_minutes,
                new_vet_id: req.vet_id,
                emergency_override: req.emergency_override,
            },
        )
        .await?;

    if let Some(status) = req.status {
        appointment = state.coordinator.transition(id, status).await?;
    }

    Ok(Json(appointment))
}

/// DELETE /api/v1/appointments/{id}
///
/// Cancels the appointment. Idempotent on an already-cancelled appointment.
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelAppointmentRequest>,
) -> Result<impl IntoResponse> {
    let appointment = state.coordinator.cancel(id, req.reason).await?;
    Ok(Json(appointment))
}

/// POST /api/v1/appointments/{id}/transition/{status}
pub async fn transition_appointment(
    State(state): State<AppState>,
    Path((id, status)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse> {
    let new_status = parse_status(&status)?;
    let appointment = state.coordinator.transition(id, new_status).await?;
    Ok(Json(appointment))
}

fn parse_status(raw: &str) -> Result<AppointmentStatus> {
    match raw.to_ascii_uppercase().as_str() {
        "CONFIRMED" => Ok(AppointmentStatus::Confirmed),
        "IN_PROGRESS" => Ok(AppointmentStatus::InProgress),
        "COMPLETED" => Ok(AppointmentStatus::Completed),
        "NO_SHOW" => Ok(AppointmentStatus::NoShow),
        other => Err(AppError::Validation(format!("unknown status: {other}"))),
    }
}

/// Query parameters for listing appointments within a window.
#[derive(Debug, Deserialize)]
pub struct ListAppointmentsQuery {
    pub practice_id: Uuid,
    pub vet_id: Option<Uuid>,
    pub window_start_utc: DateTime<Utc>,
    pub window_end_utc: DateTime<Utc>,
}

/// GET /api/v1/appointments
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<impl IntoResponse> {
    let appointments: Vec<Appointment> = state
        .store
        .list_appointments(
            query.practice_id,
            query.vet_id,
            (query.window_start_utc, query.window_end_utc),
            &[],
        )
        .await?;

    Ok(Json(appointments))
}
