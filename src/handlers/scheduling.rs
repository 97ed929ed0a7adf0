/*!
 * Scheduling HTTP Handlers
 *
 * Staff-facing slot discovery. Speaks entirely in resolved UTC instants —
 * the staff console, unlike the voice surface, is expected to have already
 * localised any calendar picker input before calling this endpoint.
 */

use axum::{extract::{Query, State}, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{SlotQueryResult, TimePreference};
use crate::services::SlotQuery;
use crate::state::AppState;
use crate::utils::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub practice_id: Uuid,
    pub vet_id: Option<Uuid>,
    pub window_start_utc: DateTime<Utc>,
    pub window_end_utc: DateTime<Utc>,
    pub slot_minutes: Option<i64>,
    pub time_preference: Option<TimePreference>,
    /// IANA timezone of the practice, needed only to apply `time_preference`.
    pub practice_timezone: String,
}

/// GET /api/v1/scheduling/slots
///
/// Compute the bookable slots for a practice (optionally scoped to one vet)
/// over a caller-supplied UTC window.
pub async fn get_available_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotsQuery>,
) -> Result<impl IntoResponse> {
    let practice_tz =
        Tz::from_str(&query.practice_timezone).map_err(|_| AppError::UnknownTimezone(query.practice_timezone.clone()))?;

    let slot_query = SlotQuery {
        practice_id: query.practice_id,
        vet_user_id: query.vet_id,
        window_start_utc: query.window_start_utc,
        window_end_utc: query.window_end_utc,
        slot_minutes: query.slot_minutes.unwrap_or_else(SlotQuery::default_slot_minutes),
        time_preference: query.time_preference,
        practice_tz,
    };

    let result: SlotQueryResult = state.gateway.find_slots_staff(&slot_query).await?;

    Ok(Json(result))
}
