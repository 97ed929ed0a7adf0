/*!
 * VetAvailability Model
 *
 * One record per concrete window in which a named veterinarian is
 * available (or explicitly unavailable). Windows are always materialised
 * as absolute UTC instants — recurring templates, if any, are a generator
 * external to this core (see `Non-goals`).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of an availability window.
///
/// AVAILABLE and EMERGENCY_ONLY are *positive* — they add to bookable time.
/// SURGERY_BLOCK and UNAVAILABLE are *negative* — they subtract from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityType {
    Available,
    EmergencyOnly,
    SurgeryBlock,
    Unavailable,
}

impl AvailabilityType {
    /// Positive types add to bookable time; negative types subtract from it.
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Available | Self::EmergencyOnly)
    }

    pub fn is_negative(self) -> bool {
        !self.is_positive()
    }
}

/// A concrete window of vet availability or unavailability.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct VetAvailability {
    pub id: Uuid,
    pub practice_id: Uuid,
    pub vet_user_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub availability_type: AvailabilityType,
    pub is_active: bool,
}

impl VetAvailability {
    /// Whether `[start_at, end_at)` overlaps `[window_start, window_end)`.
    pub fn overlaps(&self, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> bool {
        self.start_at < window_end && window_start < self.end_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(start_hour: u32, end_hour: u32, kind: AvailabilityType) -> VetAvailability {
        VetAvailability {
            id: Uuid::new_v4(),
            practice_id: Uuid::new_v4(),
            vet_user_id: Uuid::new_v4(),
            start_at: Utc.with_ymd_and_hms(2025, 10, 4, start_hour, 0, 0).unwrap(),
            end_at: Utc.with_ymd_and_hms(2025, 10, 4, end_hour, 0, 0).unwrap(),
            availability_type: kind,
            is_active: true,
        }
    }

    #[test]
    fn available_and_emergency_only_are_positive() {
        assert!(AvailabilityType::Available.is_positive());
        assert!(AvailabilityType::EmergencyOnly.is_positive());
        assert!(!AvailabilityType::SurgeryBlock.is_positive());
        assert!(!AvailabilityType::Unavailable.is_positive());
    }

    #[test]
    fn overlap_detects_partial_intersection() {
        let w = window(9, 12, AvailabilityType::Available);
        let query_start = Utc.with_ymd_and_hms(2025, 10, 4, 11, 0, 0).unwrap();
        let query_end = Utc.with_ymd_and_hms(2025, 10, 4, 13, 0, 0).unwrap();
        assert!(w.overlaps(query_start, query_end));
    }

    #[test]
    fn adjacent_windows_do_not_overlap() {
        let w = window(9, 12, AvailabilityType::Available);
        let query_start = Utc.with_ymd_and_hms(2025, 10, 4, 12, 0, 0).unwrap();
        let query_end = Utc.with_ymd_and_hms(2025, 10, 4, 14, 0, 0).unwrap();
        assert!(!w.overlaps(query_start, query_end));
    }
}
