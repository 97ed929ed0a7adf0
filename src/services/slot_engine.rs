/*!
 * Slot Engine
 *
 * Computes the effective set of bookable slots for a query. Pure interval
 * arithmetic over already-fetched rows — the only I/O in this module is the
 * `AvailabilityStore` reads at the top of `generate`.
 *
 * The Slot Engine never fails on business conditions (no hours, no vet
 * availability); it returns an empty result with a structured reason. It
 * fails only on infrastructure errors, which propagate as `AppError`.
 */

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::models::{
    Appointment, AvailabilityType, Slot, SlotClassification, SlotQueryReason, SlotQueryResult,
    TimePreference, VetAvailability,
};
use crate::services::availability_store::AvailabilityStore;
use crate::utils::Result;

/// Query parameters for `SlotEngine::generate`.
#[derive(Debug, Clone)]
pub struct SlotQuery {
    pub practice_id: Uuid,
    pub vet_user_id: Option<Uuid>,
    pub window_start_utc: DateTime<Utc>,
    pub window_end_utc: DateTime<Utc>,
    pub slot_minutes: i64,
    pub time_preference: Option<TimePreference>,
    /// Needed only to filter by `time_preference`, which is defined in
    /// practice-local clock time.
    pub practice_tz: Tz,
}

impl SlotQuery {
    pub fn default_slot_minutes() -> i64 {
        30
    }
}

pub struct SlotEngine {
    store: Arc<AvailabilityStore>,
}

/// A closed interval of UTC instants, half-open `[start, end)`.
#[derive(Debug, Clone, Copy)]
struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    fn intersect(&self, other: &Interval) -> Option<Interval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(Interval { start, end })
        } else {
            None
        }
    }

    /// Subtract `cut` from `self`, yielding zero, one, or two remaining pieces.
    fn subtract(&self, cut: &Interval) -> Vec<Interval> {
        let mut remaining = Vec::new();
        if cut.end <= self.start || cut.start >= self.end {
            remaining.push(*self);
            return remaining;
        }
        if cut.start > self.start {
            remaining.push(Interval {
                start: self.start,
                end: cut.start,
            });
        }
        if cut.end < self.end {
            remaining.push(Interval {
                start: cut.end,
                end: self.end,
            });
        }
        remaining
    }
}

fn subtract_all(base: Vec<Interval>, cuts: &[Interval]) -> Vec<Interval> {
    let mut remaining = base;
    for cut in cuts {
        remaining = remaining
            .into_iter()
            .flat_map(|interval| interval.subtract(cut))
            .collect();
    }
    remaining
}

impl SlotEngine {
    pub fn new(store: Arc<AvailabilityStore>) -> Self {
        Self { store }
    }

    /// Compute bookable slots for `query`. Never errors on business
    /// conditions — empty results carry a `SlotQueryReason`.
    pub async fn generate(&self, query: &SlotQuery) -> Result<SlotQueryResult> {
        let mut open_intervals_by_date: HashMap<chrono::NaiveDate, Interval> = HashMap::new();
        let mut cursor = query.window_start_utc;

        // Probe the set of local dates covered by the UTC window as a
        // conservative superset, then clip each date's open interval to the
        // practice's actual hours via `practice_tz` — never the raw window.
        while cursor < query.window_end_utc {
            let local_date = cursor.with_timezone(&query.practice_tz).date_naive();
            if let std::collections::hash_map::Entry::Vacant(entry) =
                open_intervals_by_date.entry(local_date)
            {
                if let Some(hours) = self
                    .store
                    .get_practice_hours(query.practice_id, local_date)
                    .await?
                {
                    if let Some((open_utc, close_utc)) =
                        hours.open_close_utc(local_date, query.practice_tz)
                    {
                        let window = Interval {
                            start: query.window_start_utc,
                            end: query.window_end_utc,
                        };
                        if let Some(clipped) = window.intersect(&Interval {
                            start: open_utc,
                            end: close_utc,
                        }) {
                            entry.insert(clipped);
                        }
                    }
                }
            }
            cursor += Duration::days(1);
        }

        if open_intervals_by_date.is_empty() {
            return Ok(SlotQueryResult::empty(SlotQueryReason::NoHours));
        }

        let availability = self
            .store
            .list_vet_availability(
                query.practice_id,
                query.vet_user_id,
                (query.window_start_utc, query.window_end_utc),
            )
            .await?;

        if availability.iter().all(|w| w.availability_type.is_negative()) {
            return Ok(SlotQueryResult::empty(SlotQueryReason::NoVetAvailability));
        }

        let appointments = self
            .store
            .list_appointments(
                query.practice_id,
                query.vet_user_id,
                (query.window_start_utc, query.window_end_utc),
                &[],
            )
            .await?;

        let by_vet = group_by_vet(&availability);
        let mut slots = Vec::new();

        for (vet_id, windows) in by_vet {
            let positive: Vec<(Interval, SlotClassification)> = windows
                .iter()
                .filter(|w| w.availability_type.is_positive())
                .filter_map(|w| {
                    SlotClassification::from_availability_type(w.availability_type)
                        .map(|c| (Interval { start: w.start_at, end: w.end_at }, c))
                })
                .collect();

            let negative: Vec<Interval> = windows
                .iter()
                .filter(|w| w.availability_type.is_negative())
                .map(|w| Interval { start: w.start_at, end: w.end_at })
                .collect();

            let vet_appointments: Vec<Interval> = appointments
                .iter()
                .filter(|a| a.assigned_vet_user_id == Some(vet_id))
                .map(appointment_interval)
                .collect();

            for window_open in open_intervals_by_date.values() {
                // Clip each positive window to practice hours, subtract
                // negative windows and existing appointments, tie-breaking
                // overlapping positive intervals toward AVAILABLE.
                let mut free: Vec<(Interval, SlotClassification)> = Vec::new();
                for (positive_interval, classification) in &positive {
                    if let Some(clipped) = positive_interval.intersect(window_open) {
                        free.push((clipped, *classification));
                    }
                }
                free.sort_by_key(|(_, c)| *c != SlotClassification::Available);

                for (interval, classification) in free {
                    let pieces = subtract_all(vec![interval], &negative);
                    let pieces = subtract_all(pieces, &vet_appointments);
                    for piece in pieces {
                        enumerate_grid(piece, query.slot_minutes, vet_id, classification, &mut slots);
                    }
                }
            }
        }

        if let Some(preference) = query.time_preference {
            slots.retain(|slot| slot_in_preference(slot, preference, query.practice_tz));
        }

        slots.sort_by_key(|s| s.start_at_utc);

        if slots.is_empty() {
            return Ok(SlotQueryResult::empty(SlotQueryReason::NoFreeCapacity));
        }

        Ok(SlotQueryResult::found(slots))
    }
}

fn group_by_vet(windows: &[VetAvailability]) -> HashMap<Uuid, Vec<&VetAvailability>> {
    let mut map: HashMap<Uuid, Vec<&VetAvailability>> = HashMap::new();
    for w in windows {
        map.entry(w.vet_user_id).or_default().push(w);
    }
    map
}

fn appointment_interval(a: &Appointment) -> Interval {
    let (start, end) = a.interval();
    Interval { start, end }
}

/// Enumerate grid-aligned slot positions (aligned to local midnight) whose
/// full `slot_minutes` extent lies within `free`.
fn enumerate_grid(
    free: Interval,
    slot_minutes: i64,
    vet_user_id: Uuid,
    classification: SlotClassification,
    out: &mut Vec<Slot>,
) {
    if slot_minutes <= 0 {
        return;
    }
    let step = Duration::minutes(slot_minutes);
    let mut cursor = align_to_grid(free.start, slot_minutes);
    while cursor < free.start {
        cursor += step;
    }
    while cursor + step <= free.end {
        out.push(Slot {
            vet_user_id,
            start_at_utc: cursor,
            end_at_utc: cursor + step,
            classification,
        });
        cursor += step;
    }
}

/// Align `instant` to the nearest grid line at or before it, where the grid
/// is anchored to UTC midnight of `instant`'s date in multiples of
/// `slot_minutes`. This is a coarse alignment; exact local-midnight
/// alignment is the caller's responsibility via window selection.
fn align_to_grid(instant: DateTime<Utc>, slot_minutes: i64) -> DateTime<Utc> {
    let midnight = instant
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc();
    let elapsed_minutes = (instant - midnight).num_minutes();
    let aligned_minutes = (elapsed_minutes / slot_minutes) * slot_minutes;
    midnight + Duration::minutes(aligned_minutes)
}

/// Whether `slot` starts within `preference`'s fixed local clock window,
/// evaluated in `tz`.
fn slot_in_preference(slot: &Slot, preference: TimePreference, tz: Tz) -> bool {
    let (window_start, window_end) = preference.local_window();
    let local_time = slot.start_at_utc.with_timezone(&tz).time();
    local_time >= window_start && local_time < window_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn interval_intersect_overlapping_ranges() {
        let a = Interval { start: utc(2025, 1, 1, 9, 0), end: utc(2025, 1, 1, 12, 0) };
        let b = Interval { start: utc(2025, 1, 1, 10, 0), end: utc(2025, 1, 1, 13, 0) };
        let result = a.intersect(&b).unwrap();
        assert_eq!(result.start, utc(2025, 1, 1, 10, 0));
        assert_eq!(result.end, utc(2025, 1, 1, 12, 0));
    }

    #[test]
    fn interval_intersect_disjoint_ranges_is_none() {
        let a = Interval { start: utc(2025, 1, 1, 9, 0), end: utc(2025, 1, 1, 10, 0) };
        let b = Interval { start: utc(2025, 1, 1, 11, 0), end: utc(2025, 1, 1, 12, 0) };
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn subtract_from_middle_yields_two_pieces() {
        let whole = Interval { start: utc(2025, 1, 1, 9, 0), end: utc(2025, 1, 1, 17, 0) };
        let cut = Interval { start: utc(2025, 1, 1, 12, 0), end: utc(2025, 1, 1, 13, 0) };
        let pieces = whole.subtract(&cut);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].end, utc(2025, 1, 1, 12, 0));
        assert_eq!(pieces[1].start, utc(2025, 1, 1, 13, 0));
    }

    #[test]
    fn subtract_entire_interval_yields_nothing() {
        let whole = Interval { start: utc(2025, 1, 1, 9, 0), end: utc(2025, 1, 1, 17, 0) };
        let cut = Interval { start: utc(2025, 1, 1, 8, 0), end: utc(2025, 1, 1, 18, 0) };
        assert!(whole.subtract(&cut).is_empty());
    }

    #[test]
    fn subtract_disjoint_cut_leaves_interval_whole() {
        let whole = Interval { start: utc(2025, 1, 1, 9, 0), end: utc(2025, 1, 1, 10, 0) };
        let cut = Interval { start: utc(2025, 1, 1, 11, 0), end: utc(2025, 1, 1, 12, 0) };
        let pieces = whole.subtract(&cut);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].start, whole.start);
        assert_eq!(pieces[0].end, whole.end);
    }

    #[test]
    fn enumerate_grid_produces_fully_enclosed_slots_only() {
        let free = Interval { start: utc(2025, 1, 1, 9, 0), end: utc(2025, 1, 1, 10, 10) };
        let mut out = Vec::new();
        enumerate_grid(free, 30, Uuid::new_v4(), SlotClassification::Available, &mut out);
        // 9:00-9:30, 9:30-10:00 fit; 10:00-10:30 would exceed 10:10.
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].start_at_utc, utc(2025, 1, 1, 9, 0));
        assert_eq!(out[1].start_at_utc, utc(2025, 1, 1, 9, 30));
    }

    #[test]
    fn enumerate_grid_produces_no_partial_slot_at_the_boundary() {
        let free = Interval { start: utc(2025, 1, 1, 9, 0), end: utc(2025, 1, 1, 9, 45) };
        let mut out = Vec::new();
        enumerate_grid(free, 30, Uuid::new_v4(), SlotClassification::Available, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].end_at_utc, utc(2025, 1, 1, 9, 30));
    }
}
