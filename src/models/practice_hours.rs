/*!
 * PracticeHours Model
 *
 * One record per (practice, day-of-week, effective-range). Wall-clock open
 * and close times are interpreted against the practice's timezone on every
 * query — they are never stored with an implicit zone attached.
 */

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ISO 8601 day-of-week numbering: Monday = 1 .. Sunday = 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum DayOfWeek {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
    Sunday = 7,
}

impl DayOfWeek {
    pub fn from_i16(n: i16) -> Option<Self> {
        match n {
            1 => Some(Self::Monday),
            2 => Some(Self::Tuesday),
            3 => Some(Self::Wednesday),
            4 => Some(Self::Thursday),
            5 => Some(Self::Friday),
            6 => Some(Self::Saturday),
            7 => Some(Self::Sunday),
            _ => None,
        }
    }

    pub fn from_chrono_weekday(weekday: chrono::Weekday) -> Self {
        // chrono's num_days_from_monday is 0-indexed; ours is 1-indexed.
        Self::from_i16(weekday.num_days_from_monday() as i16 + 1)
            .expect("num_days_from_monday() + 1 is always in 1..=7")
    }
}

/// Practice operating hours for a single weekday within an effective date
/// range. Invariant: for any (practice, weekday, UTC date), at most one
/// active record applies — enforced by the Availability Store's query, not
/// by this type.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PracticeHours {
    pub id: Uuid,
    pub practice_id: Uuid,
    pub day_of_week: i16,
    /// `None` together with `close_time_local = None` means closed that
    /// weekday.
    pub open_time_local: Option<NaiveTime>,
    pub close_time_local: Option<NaiveTime>,
    pub effective_from: NaiveDate,
    pub effective_until: Option<NaiveDate>,
    pub is_active: bool,
}

impl PracticeHours {
    /// Whether this record makes the practice open at all on its weekday.
    pub fn is_open(&self) -> bool {
        self.open_time_local.is_some() && self.close_time_local.is_some()
    }

    /// Whether `date` falls within this record's effective range.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_until.map_or(true, |until| date <= until)
    }

    /// Resolve this record's wall-clock open/close times against
    /// `local_date` in `tz` as a `[open_utc, close_utc)` UTC interval.
    /// Returns `None` when the practice is closed on this record (see
    /// `is_open`).
    pub fn open_close_utc(&self, local_date: NaiveDate, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let (open, close) = (self.open_time_local?, self.close_time_local?);
        let midnight_utc = crate::time_anchor::day_bounds(local_date, tz).0;
        let open_utc = midnight_utc + (open - NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        let close_utc = open_utc + (close - open);
        Some((open_utc, close_utc))
    }
}
