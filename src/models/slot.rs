/*!
 * Slot Model
 *
 * A `Slot` is the Slot Engine's unit of output: a single bookable window for
 * one vet. Slots are never persisted — they are computed on demand from
 * `VetAvailability` and `Appointment` rows and discarded after the response
 * is sent.
 */

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::vet_availability::AvailabilityType;

/// The classification a bookable slot was computed under. Only the positive
/// `AvailabilityType` variants can produce a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotClassification {
    Available,
    EmergencyOnly,
}

impl SlotClassification {
    pub fn from_availability_type(kind: AvailabilityType) -> Option<Self> {
        match kind {
            AvailabilityType::Available => Some(Self::Available),
            AvailabilityType::EmergencyOnly => Some(Self::EmergencyOnly),
            AvailabilityType::SurgeryBlock | AvailabilityType::Unavailable => None,
        }
    }
}

/// A single bookable window for one vet, already clipped to a requested
/// duration and free of conflicting appointments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub vet_user_id: Uuid,
    pub start_at_utc: DateTime<Utc>,
    pub end_at_utc: DateTime<Utc>,
    pub classification: SlotClassification,
}

impl Slot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_at_utc - self.start_at_utc).num_minutes()
    }
}

/// A coarse part-of-day filter for voice callers who don't think in clock
/// times ("sometime in the afternoon"). Windows are fixed, practice-local,
/// half-open, and independent of practice hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePreference {
    Morning,
    Afternoon,
    Evening,
}

impl TimePreference {
    /// The fixed local `[start, end)` clock window for this preference.
    pub fn local_window(self) -> (NaiveTime, NaiveTime) {
        match self {
            Self::Morning => (
                NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            ),
            Self::Afternoon => (
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            ),
            Self::Evening => (
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            ),
        }
    }
}

/// Structured reason the Slot Engine returns an empty result instead of an
/// error — querying for a day with no availability is a normal outcome, not
/// a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotQueryReason {
    /// The practice has no hours configured for the requested date.
    NoHours,
    /// The practice is open but no vet has a positive availability window
    /// in range.
    NoVetAvailability,
    /// Every candidate window was consumed by existing appointments or
    /// negative availability.
    NoFreeCapacity,
}

impl SlotQueryReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::NoHours => "the practice is closed on the requested date",
            Self::NoVetAvailability => "no veterinarian is available in the requested window",
            Self::NoFreeCapacity => "all available time in the requested window is already booked",
        }
    }
}

/// Result of a slot query: either a non-empty list of slots, or a
/// structured reason why the list is empty. Never both.
#[derive(Debug, Clone, Serialize)]
pub struct SlotQueryResult {
    pub slots: Vec<Slot>,
    pub empty_reason: Option<SlotQueryReason>,
}

impl SlotQueryResult {
    pub fn found(slots: Vec<Slot>) -> Self {
        Self {
            slots,
            empty_reason: None,
        }
    }

    pub fn empty(reason: SlotQueryReason) -> Self {
        Self {
            slots: Vec::new(),
            empty_reason: Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn positive_availability_types_map_to_classifications() {
        assert_eq!(
            SlotClassification::from_availability_type(AvailabilityType::Available),
            Some(SlotClassification::Available)
        );
        assert_eq!(
            SlotClassification::from_availability_type(AvailabilityType::EmergencyOnly),
            Some(SlotClassification::EmergencyOnly)
        );
    }

    #[test]
    fn negative_availability_types_produce_no_classification() {
        assert_eq!(
            SlotClassification::from_availability_type(AvailabilityType::SurgeryBlock),
            None
        );
        assert_eq!(
            SlotClassification::from_availability_type(AvailabilityType::Unavailable),
            None
        );
    }

    #[test]
    fn time_preference_windows_are_contiguous_and_ordered() {
        let (_, morning_end) = TimePreference::Morning.local_window();
        let (afternoon_start, afternoon_end) = TimePreference::Afternoon.local_window();
        let (evening_start, _) = TimePreference::Evening.local_window();
        assert_eq!(morning_end, afternoon_start);
        assert_eq!(afternoon_end, evening_start);
    }

    #[test]
    fn slot_duration_reflects_span() {
        let slot = Slot {
            vet_user_id: Uuid::new_v4(),
            start_at_utc: Utc.with_ymd_and_hms(2025, 10, 4, 16, 0, 0).unwrap(),
            end_at_utc: Utc.with_ymd_and_hms(2025, 10, 4, 16, 30, 0).unwrap(),
            classification: SlotClassification::Available,
        };
        assert_eq!(slot.duration_minutes(), 30);
    }

    #[test]
    fn empty_result_carries_no_slots() {
        let result = SlotQueryResult::empty(SlotQueryReason::NoHours);
        assert!(result.slots.is_empty());
        assert_eq!(result.empty_reason, Some(SlotQueryReason::NoHours));
    }
}
