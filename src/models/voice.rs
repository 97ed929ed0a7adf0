/*!
 * Voice Function-Call Model
 *
 * The voice surface speaks a closed set of function calls, mirroring the
 * shape a realtime voice-agent platform emits: a tagged JSON envelope of
 * `{"function": "...", "arguments": {...}}`. Anything outside this closed
 * set is rejected with `UNKNOWN_FUNCTION` rather than silently ignored.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slot::TimePreference;

/// Arguments for the `get_available_times` voice function.
#[derive(Debug, Clone, Deserialize)]
pub struct GetAvailableTimesArgs {
    pub practice_id: Uuid,
    pub vet_id: Option<Uuid>,
    /// Free-form natural-language expression, resolved by the Time Anchor
    /// against the calling practice's timezone (e.g. "tomorrow afternoon",
    /// "next Tuesday").
    pub requested_day_expression: String,
    pub time_preference: Option<TimePreference>,
    pub duration_minutes: i32,
    #[serde(default)]
    pub emergency: bool,
}

/// Arguments for the `book_appointment` voice function.
#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentArgs {
    pub practice_id: Uuid,
    pub vet_id: Option<Uuid>,
    pub requested_time_expression: String,
    pub duration_minutes: i32,
    pub owner_id: Uuid,
    pub pet_ids: Vec<Uuid>,
    pub title: String,
    #[serde(default)]
    pub emergency_override: bool,
    /// Backfill escape hatch: permits booking an appointment whose resolved
    /// instant is already in the past. Rejected as `PAST_INSTANT` otherwise.
    #[serde(default)]
    pub allow_past: bool,
}

/// Arguments for the `cancel_appointment` voice function.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelAppointmentArgs {
    pub appointment_id: Uuid,
    pub reason: Option<String>,
}

/// The closed set of function calls the voice surface accepts. Deserialized
/// from `{"function": "...", "arguments": {...}}`; any other `function`
/// value fails with `AppError::UnknownFunction`.
#[derive(Debug, Clone)]
pub enum VoiceFunctionCall {
    GetAvailableTimes(GetAvailableTimesArgs),
    BookAppointment(BookAppointmentArgs),
    CancelAppointment(CancelAppointmentArgs),
}

/// Raw wire envelope, deserialized first so the `function` discriminant can
/// be inspected before committing to an arguments shape.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceFunctionCallEnvelope {
    pub function: String,
    pub arguments: serde_json::Value,
}

impl VoiceFunctionCall {
    pub const GET_AVAILABLE_TIMES: &'static str = "get_available_times";
    pub const BOOK_APPOINTMENT: &'static str = "book_appointment";
    pub const CANCEL_APPOINTMENT: &'static str = "cancel_appointment";

    /// Parse a raw envelope into a closed `VoiceFunctionCall`, or
    /// `Err(function_name)` if it names a function outside the closed set.
    pub fn from_envelope(envelope: VoiceFunctionCallEnvelope) -> Result<Self, String> {
        match envelope.function.as_str() {
            Self::GET_AVAILABLE_TIMES => serde_json::from_value(envelope.arguments)
                .map(VoiceFunctionCall::GetAvailableTimes)
                .map_err(|_| envelope.function),
            Self::BOOK_APPOINTMENT => serde_json::from_value(envelope.arguments)
                .map(VoiceFunctionCall::BookAppointment)
                .map_err(|_| envelope.function),
            Self::CANCEL_APPOINTMENT => serde_json::from_value(envelope.arguments)
                .map(VoiceFunctionCall::CancelAppointment)
                .map_err(|_| envelope.function),
            other => Err(other.to_string()),
        }
    }
}

/// Uniform voice-surface response envelope, returned for every function
/// call regardless of outcome so the voice agent has one shape to parse.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceFunctionResult {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl VoiceFunctionResult {
    pub fn ok(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// A resolved booking confirmation handed back to the voice surface after a
/// successful `book_appointment` call.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceBookingConfirmation {
    pub appointment_id: Uuid,
    pub confirmed_time_local: String,
    pub confirmed_time_utc: DateTime<Utc>,
    pub vet_user_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognised_function_name_parses_into_matching_variant() {
        let envelope = VoiceFunctionCallEnvelope {
            function: "get_available_times".to_string(),
            arguments: json!({
                "practice_id": Uuid::new_v4(),
                "vet_id": null,
                "requested_day_expression": "tomorrow afternoon",
                "time_preference": "afternoon",
                "duration_minutes": 30,
            }),
        };
        let call = VoiceFunctionCall::from_envelope(envelope).unwrap();
        assert!(matches!(call, VoiceFunctionCall::GetAvailableTimes(_)));
    }

    #[test]
    fn unrecognised_function_name_is_rejected() {
        let envelope = VoiceFunctionCallEnvelope {
            function: "delete_practice".to_string(),
            arguments: json!({}),
        };
        let err = VoiceFunctionCall::from_envelope(envelope).unwrap_err();
        assert_eq!(err, "delete_practice");
    }

    #[test]
    fn malformed_arguments_for_a_known_function_are_rejected() {
        let envelope = VoiceFunctionCallEnvelope {
            function: "cancel_appointment".to_string(),
            arguments: json!({"reason": "owner called"}),
        };
        assert!(VoiceFunctionCall::from_envelope(envelope).is_err());
    }
}
