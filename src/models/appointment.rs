/*!
 * Appointment Model
 *
 * Appointments are the sole source of truth for "busy" — availability is
 * always computed from them, never dually written. Created exclusively by
 * the Booking Coordinator; mutated only through its update/cancel
 * operations; never deleted (cancellation is a state transition).
 */

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Appointment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Whether a transition from `self` to `new_status` is legal.
    ///
    /// SCHEDULED -> CONFIRMED -> IN_PROGRESS -> COMPLETED.
    /// SCHEDULED/CONFIRMED/IN_PROGRESS -> CANCELLED or NO_SHOW.
    /// Terminal states (COMPLETED, CANCELLED, NO_SHOW) reject all further
    /// transitions except CANCELLED -> CANCELLED, which is idempotent.
    pub fn can_transition_to(&self, new_status: &AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        match self {
            Scheduled => matches!(new_status, Confirmed | Cancelled | NoShow),
            Confirmed => matches!(new_status, InProgress | Cancelled | NoShow),
            InProgress => matches!(new_status, Completed | Cancelled | NoShow),
            Completed | NoShow => false,
            Cancelled => matches!(new_status, Cancelled),
        }
    }

    /// Any status in {SCHEDULED, CONFIRMED, IN_PROGRESS}; the set that
    /// contributes to the no-double-booking invariant and is excluded by
    /// default from conflict-check queries.
    pub fn is_non_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled | AppointmentStatus::Confirmed | AppointmentStatus::InProgress
        )
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_non_terminal()
    }
}

/// A booked appointment.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub practice_id: Uuid,
    pub assigned_vet_user_id: Option<Uuid>,
    pub appointment_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub pet_owner_id: Uuid,
    /// Non-empty set of pet ids; owned exclusively by the appointment.
    pub pet_ids: Vec<Uuid>,
    pub title: String,
    pub notes: Option<String>,
    pub created_by_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// The appointment's half-open busy interval `[appointment_at, appointment_at + duration)`.
    pub fn interval(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.appointment_at + Duration::minutes(self.duration_minutes as i64);
        (self.appointment_at, end)
    }

    /// Whether this appointment's busy interval overlaps `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let (a_start, a_end) = self.interval();
        a_start < end && start < a_end
    }
}

/// Domain events emitted after commit by the Booking Coordinator.
/// Consumers are external (notifications, billing) and are never awaited
/// by the commit path itself.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AppointmentEvent {
    #[serde(rename = "appointment.created")]
    Created(AppointmentEventPayload),
    #[serde(rename = "appointment.rescheduled")]
    Rescheduled(AppointmentEventPayload),
    #[serde(rename = "appointment.cancelled")]
    Cancelled(AppointmentEventPayload),
    #[serde(rename = "appointment.status_changed")]
    StatusChanged(AppointmentEventPayload),
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentEventPayload {
    pub appointment_id: Uuid,
    pub practice_id: Uuid,
    pub vet_user_id: Option<Uuid>,
    pub appointment_at_utc: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<&Appointment> for AppointmentEventPayload {
    fn from(a: &Appointment) -> Self {
        Self {
            appointment_id: a.id,
            practice_id: a.practice_id,
            vet_user_id: a.assigned_vet_user_id,
            appointment_at_utc: a.appointment_at,
            duration_minutes: a.duration_minutes,
            status: a.status,
            updated_at: a.updated_at,
        }
    }
}

/// Staff-surface request to create an appointment from already-resolved
/// UTC instants (as opposed to the voice surface's natural-language path,
/// which goes through Time Anchor first).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    pub practice_id: Uuid,
    pub vet_id: Option<Uuid>,
    pub appointment_at_utc: DateTime<Utc>,
    #[validate(range(min = 5, max = 480, message = "duration must be between 5 and 480 minutes"))]
    pub duration_minutes: i32,
    #[validate(length(min = 1, message = "at least one pet is required"))]
    pub pet_ids: Vec<Uuid>,
    pub owner_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub notes: Option<String>,
    pub created_by_user_id: Uuid,
    #[serde(default)]
    pub emergency_override: bool,
}

/// Staff-surface request to reschedule/patch an existing appointment. Any
/// subset of fields may be present; unset fields keep their current value.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAppointmentRequest {
    pub appointment_at_utc: Option<DateTime<Utc>>,
    #[validate(range(min = 5, max = 480))]
    pub duration_minutes: Option<i32>,
    pub vet_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub emergency_override: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            practice_id: Uuid::new_v4(),
            assigned_vet_user_id: Some(Uuid::new_v4()),
            appointment_at: Utc.with_ymd_and_hms(2025, 10, 4, 16, 0, 0).unwrap(),
            duration_minutes: 30,
            status: AppointmentStatus::Scheduled,
            pet_owner_id: Uuid::new_v4(),
            pet_ids: vec![Uuid::new_v4()],
            title: "Checkup".to_string(),
            notes: None,
            created_by_user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn scheduled_can_reach_every_non_terminal_or_terminal_peer_but_not_completed_directly() {
        let s = AppointmentStatus::Scheduled;
        assert!(s.can_transition_to(&AppointmentStatus::Confirmed));
        assert!(s.can_transition_to(&AppointmentStatus::Cancelled));
        assert!(s.can_transition_to(&AppointmentStatus::NoShow));
        assert!(!s.can_transition_to(&AppointmentStatus::InProgress));
        assert!(!s.can_transition_to(&AppointmentStatus::Completed));
    }

    #[test]
    fn confirmed_can_progress_or_terminate() {
        let c = AppointmentStatus::Confirmed;
        assert!(c.can_transition_to(&AppointmentStatus::InProgress));
        assert!(c.can_transition_to(&AppointmentStatus::Cancelled));
        assert!(c.can_transition_to(&AppointmentStatus::NoShow));
        assert!(!c.can_transition_to(&AppointmentStatus::Completed));
        assert!(!c.can_transition_to(&AppointmentStatus::Scheduled));
    }

    #[test]
    fn in_progress_can_complete_or_terminate_but_not_regress() {
        let i = AppointmentStatus::InProgress;
        assert!(i.can_transition_to(&AppointmentStatus::Completed));
        assert!(i.can_transition_to(&AppointmentStatus::Cancelled));
        assert!(i.can_transition_to(&AppointmentStatus::NoShow));
        assert!(!i.can_transition_to(&AppointmentStatus::Confirmed));
    }

    #[test]
    fn terminal_statuses_reject_all_transitions_except_cancel_idempotence() {
        assert!(!AppointmentStatus::Completed.can_transition_to(&AppointmentStatus::Scheduled));
        assert!(!AppointmentStatus::Completed.can_transition_to(&AppointmentStatus::Cancelled));
        assert!(!AppointmentStatus::NoShow.can_transition_to(&AppointmentStatus::Scheduled));
        assert!(AppointmentStatus::Cancelled.can_transition_to(&AppointmentStatus::Cancelled));
        assert!(!AppointmentStatus::Cancelled.can_transition_to(&AppointmentStatus::Scheduled));
    }

    #[test]
    fn is_non_terminal_matches_glossary_definition() {
        assert!(AppointmentStatus::Scheduled.is_non_terminal());
        assert!(AppointmentStatus::Confirmed.is_non_terminal());
        assert!(AppointmentStatus::InProgress.is_non_terminal());
        assert!(!AppointmentStatus::Completed.is_non_terminal());
        assert!(!AppointmentStatus::Cancelled.is_non_terminal());
        assert!(!AppointmentStatus::NoShow.is_non_terminal());
    }

    #[test]
    fn interval_spans_duration_minutes() {
        let a = sample();
        let (start, end) = a.interval();
        assert_eq!(start, a.appointment_at);
        assert_eq!(end, a.appointment_at + Duration::minutes(30));
    }

    #[test]
    fn overlap_is_half_open() {
        let a = sample();
        let (_, end) = a.interval();
        // A query starting exactly at this appointment's end does not overlap.
        assert!(!a.overlaps(end, end + Duration::minutes(30)));
        // A query ending exactly at this appointment's start does not overlap.
        assert!(!a.overlaps(a.appointment_at - Duration::minutes(30), a.appointment_at));
        // A query straddling the midpoint does overlap.
        assert!(a.overlaps(
            a.appointment_at + Duration::minutes(15),
            a.appointment_at + Duration::minutes(45)
        ));
    }

    #[test]
    fn serde_round_trip_preserves_status() {
        let json = serde_json::to_string(&AppointmentStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let parsed: AppointmentStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, AppointmentStatus::InProgress);
    }
}
