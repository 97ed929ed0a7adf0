/*!
 * Voice Function-Call HTTP Handler
 *
 * Single endpoint fronting the Intent Gateway for the voice surface. The
 * realtime voice-agent platform POSTs a `{"function": ..., "arguments": ...}`
 * envelope; this handler dispatches on the closed `VoiceFunctionCall` set
 * and returns a uniform `VoiceFunctionResult` regardless of which function
 * ran, so the caller has one response shape to parse no matter the outcome.
 */

use axum::{extract::State, response::IntoResponse, Json};
use chrono_tz::Tz;
use serde_json::json;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{VoiceFunctionCall, VoiceFunctionCallEnvelope, VoiceFunctionResult};
use crate::state::AppState;
use crate::utils::{AppError, Result};

/// POST /voice/functions
pub async fn handle_voice_function_call(
    State(state): State<AppState>,
    Json(envelope): Json<VoiceFunctionCallEnvelope>,
) -> Result<impl IntoResponse> {
    let raw_function = envelope.function.clone();
    let call = VoiceFunctionCall::from_envelope(envelope)
        .map_err(|_| AppError::UnknownFunction(raw_function))?;

    let result = match call {
        VoiceFunctionCall::GetAvailableTimes(args) => {
            let practice_tz = resolve_practice_timezone(&state, args.practice_id).await?;
            let slots = state
                .gateway
                .find_slots_voice(
                    args.practice_id,
                    practice_tz,
                    &args.requested_day_expression,
                    args.duration_minutes as i64,
                    args.time_preference,
                    args.vet_id,
                    chrono::Utc::now(),
                )
                .await?;

            if slots.slots.is_empty() {
                VoiceFunctionResult::ok(slots.message, json!({ "slots": [] }))
            } else {
                VoiceFunctionResult::ok(
                    "here are the available times",
                    json!({ "slots": slots.slots }),
                )
            }
        }
        VoiceFunctionCall::BookAppointment(args) => {
            let practice_tz = resolve_practice_timezone(&state, args.practice_id).await?;
            let confirmation = state
                .gateway
                .book_voice(
                    args.practice_id,
                    practice_tz,
                    &args.requested_time_expression,
                    args.duration_minutes,
                    args.vet_id,
                    args.pet_ids,
                    args.owner_id,
                    args.title,
                    args.owner_id,
                    args.emergency_override,
                    args.allow_past,
                    chrono::Utc::now(),
                )
                .await?;

            VoiceFunctionResult::ok(
                format!("booked for {}", confirmation.confirmed_time_local),
                serde_json::to_value(&confirmation).unwrap_or(json!({})),
            )
        }
        VoiceFunctionCall::CancelAppointment(args) => {
            let appointment = state.coordinator.cancel(args.appointment_id, args.reason).await?;
            VoiceFunctionResult::ok(
                "the appointment has been cancelled",
                serde_json::to_value(&appointment).unwrap_or(json!({})),
            )
        }
    };

    Ok(Json(result))
}

async fn resolve_practice_timezone(state: &AppState, practice_id: Uuid) -> Result<Tz> {
    let practice = sqlx::query_as::<_, crate::models::Practice>(
        "SELECT * FROM practices WHERE id = $1",
    )
    .bind(practice_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(AppError::from)?
    .ok_or_else(|| AppError::NotFound(format!("practice {practice_id}")))?;

    Tz::from_str(&practice.timezone).map_err(|_| AppError::UnknownTimezone(practice.timezone))
}
