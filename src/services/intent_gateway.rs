/*!
 * Intent Gateway
 *
 * Unifies the staff-structured and voice-natural surfaces onto the Slot
 * Engine and Booking Coordinator.
 */

use std::sync::Arc;

use chrono_tz::Tz;
use uuid::Uuid;

use crate::models::{
    Slot, SlotQueryResult, TimePreference, VoiceBookingConfirmation,
};
use crate::services::booking_coordinator::{BookingCoordinator, CreateAppointmentParams};
use crate::services::slot_engine::{SlotEngine, SlotQuery};
use crate::time_anchor::{self, Interpretation, InterpretError, LocalizeStyle};
use crate::utils::errors::{AppError, Result};

/// A slot localised to the practice's timezone for display, alongside the
/// raw UTC instants needed to book it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LocalisedSlot {
    #[serde(flatten)]
    pub slot: Slot,
    pub local_time: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VoiceSlotResult {
    pub slots: Vec<LocalisedSlot>,
    pub message: String,
}

pub struct IntentGateway {
    slot_engine: Arc<SlotEngine>,
    coordinator: Arc<BookingCoordinator>,
}

impl IntentGateway {
    pub fn new(slot_engine: Arc<SlotEngine>, coordinator: Arc<BookingCoordinator>) -> Self {
        Self {
            slot_engine,
            coordinator,
        }
    }

    /// Thin passthrough to the Slot Engine for the staff surface, which
    /// already speaks in UTC windows.
    pub async fn find_slots_staff(&self, query: &SlotQuery) -> Result<SlotQueryResult> {
        self.slot_engine.generate(query).await
    }

    /// Interpret a natural-language day/time expression against the
    /// practice timezone, call the Slot Engine, then localise each slot for
    /// a spoken response.
    pub async fn find_slots_voice(
        &self,
        practice_id: Uuid,
        practice_tz: Tz,
        expression: &str,
        slot_minutes: i64,
        preference: Option<TimePreference>,
        vet_id: Option<Uuid>,
        now_utc: chrono::DateTime<chrono::Utc>,
    ) -> Result<VoiceSlotResult> {
        let (window_start, window_end) = match time_anchor::interpret(expression, practice_tz, now_utc) {
            Ok(Interpretation::Window(start, end)) => (start, end),
            Ok(Interpretation::Instant(instant)) => {
                (instant, instant + chrono::Duration::minutes(slot_minutes))
            }
            Err(InterpretError::Unparseable(raw)) => return Err(AppError::Unparseable(raw)),
            Err(InterpretError::Ambiguous { message, candidates }) => {
                return Err(AppError::Ambiguous {
                    message,
                    candidates: candidates
                        .iter()
                        .map(|c| time_anchor::localize(*c, practice_tz, LocalizeStyle::Full))
                        .collect(),
                })
            }
        };

        let query = SlotQuery {
            practice_id,
            vet_user_id: vet_id,
            window_start_utc: window_start,
            window_end_utc: window_end,
            slot_minutes,
            time_preference: preference,
            practice_tz,
        };

        let result = self.slot_engine.generate(&query).await?;

        if let Some(reason) = result.empty_reason {
            return Ok(VoiceSlotResult {
                slots: Vec::new(),
                message: reason.message().to_string(),
            });
        }

        let localised = result
            .slots
            .into_iter()
            .map(|slot| {
                let local_time = time_anchor::localize(slot.start_at_utc, practice_tz, LocalizeStyle::Full);
                LocalisedSlot { slot, local_time }
            })
            .collect();

        Ok(VoiceSlotResult {
            slots: localised,
            message: "here are the available times".to_string(),
        })
    }

    /// Interpret `expression` to a single point instant (ambiguity is a hard
    /// failure here, unlike `find_slots_voice`) and delegate to the Booking
    /// Coordinator.
    #[allow(clippy::too_many_arguments)]
    pub async fn book_voice(
        &self,
        practice_id: Uuid,
        practice_tz: Tz,
        expression: &str,
        duration_minutes: i32,
        vet_id: Option<Uuid>,
        pet_ids: Vec<Uuid>,
        owner_id: Uuid,
        title: String,
        created_by_user_id: Uuid,
        emergency_override: bool,
        allow_past: bool,
        now_utc: chrono::DateTime<chrono::Utc>,
    ) -> Result<VoiceBookingConfirmation> {
        let instant = match time_anchor::interpret(expression, practice_tz, now_utc) {
            Ok(Interpretation::Instant(instant)) => instant,
            Ok(Interpretation::Window(start, _end)) => start,
            Err(InterpretError::Unparseable(raw)) => return Err(AppError::Unparseable(raw)),
            Err(InterpretError::Ambiguous { message, candidates }) => {
                return Err(AppError::Ambiguous {
                    message,
                    candidates: candidates
                        .iter()
                        .map(|c| time_anchor::localize(*c, practice_tz, LocalizeStyle::Full))
                        .collect(),
                })
            }
        };

        if !allow_past && instant < now_utc {
            return Err(AppError::PastInstant(expression.to_string()));
        }

        let appointment = self
            .coordinator
            .create(CreateAppointmentParams {
                practice_id,
                vet_id,
                appointment_at_utc: instant,
                duration_minutes,
                pet_ids,
                owner_id,
                title,
                notes: None,
                created_by_user_id,
                emergency_override,
            })
            .await?;

        let confirmed_time_local = time_anchor::localize(instant, practice_tz, LocalizeStyle::Full);

        Ok(VoiceBookingConfirmation {
            appointment_id: appointment.id,
            confirmed_time_local,
            confirmed_time_utc: instant,
            vet_user_id: appointment.assigned_vet_user_id,
        })
    }
}
