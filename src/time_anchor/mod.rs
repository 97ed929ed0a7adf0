/*!
 * Time Anchor
 *
 * Translates between human time expressions and UTC instants. All timezone
 * math lives here; every other component receives and returns UTC instants
 * only. This eliminates the class of "phantom shift" bugs where a
 * late-evening local time stored as a naive date+time got interpreted as
 * UTC.
 *
 * Pure computation over `chrono` + `chrono_tz` types — no struct, no stored
 * state.
 */

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;

/// Outcome of `interpret`: either a single resolvable instant, or a span the
/// expression denotes (e.g. "morning").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    Instant(DateTime<Utc>),
    Window(DateTime<Utc>, DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpretError {
    Unparseable(String),
    Ambiguous {
        message: String,
        candidates: Vec<DateTime<Utc>>,
    },
}

/// Rendering style for `localize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalizeStyle {
    TimeOnly,
    Full,
    DateOnly,
}

fn part_of_day_window(part: &str) -> Option<(NaiveTime, NaiveTime)> {
    match part {
        "morning" => Some((
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        )),
        "afternoon" => Some((
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )),
        "evening" => Some((
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        )),
        _ => None,
    }
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.to_ascii_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    match name.to_ascii_lowercase().as_str() {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}

fn iso_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(\d{4})-(\d{2})-(\d{2})[ T](\d{1,2}):(\d{2})$").unwrap()
    })
}

fn absolute_month_day_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^([A-Za-z]+)\s+(\d{1,2})(?:st|nd|rd|th)?(?:\s+at)?\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)$",
        )
        .unwrap()
    })
}

/// Matches `localize`'s `Full` style verbatim, e.g. "9:00 PM on Friday,
/// October 3", so that output can round-trip back through `interpret`.
fn full_localized_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(\d{1,2}):(\d{2})\s*(am|pm)\s+on\s+[A-Za-z]+,\s+([A-Za-z]+)\s+(\d{1,2})$",
        )
        .unwrap()
    })
}

/// Resolve a month/day/12-hour-clock expression against `today`, rolling the
/// year forward when the resulting date has already passed. Shared by the
/// "October 3 at 9 PM" grammar and the reparse of `localize`'s `Full` style.
fn resolve_absolute_month_day(
    practice_tz: Tz,
    today: NaiveDate,
    month: u32,
    day: u32,
    mut hour: u32,
    minute: u32,
    meridiem: &str,
) -> Result<DateTime<Utc>, InterpretError> {
    let meridiem = meridiem.to_ascii_lowercase();
    if meridiem == "pm" && hour != 12 {
        hour += 12;
    } else if meridiem == "am" && hour == 12 {
        hour = 0;
    }
    let mut year = today.year();
    let mut date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| InterpretError::Unparseable(format!("{year}-{month}-{day}")))?;
    // With no year spoken, the expression always means the soonest
    // future occurrence.
    if date < today {
        year += 1;
        date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| InterpretError::Unparseable(format!("{year}-{month}-{day}")))?;
    }
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| InterpretError::Unparseable(format!("{hour}:{minute}")))?;
    local_datetime_to_utc(practice_tz, NaiveDateTime::new(date, time))
}

fn relative_offset_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^in\s+(\d+)\s+(minute|minutes|hour|hours)$").unwrap())
}

fn next_weekday_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^next\s+([A-Za-z]+)$").unwrap())
}

/// Project `now_utc` into the practice's local calendar date.
fn local_today(practice_tz: Tz, now_utc: DateTime<Utc>) -> NaiveDate {
    now_utc.with_timezone(&practice_tz).date_naive()
}

fn local_datetime_to_utc(practice_tz: Tz, local: NaiveDateTime) -> Result<DateTime<Utc>, InterpretError> {
    match practice_tz.from_local_datetime(&local) {
        chrono::LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        chrono::LocalResult::Ambiguous(earlier, _later) => {
            // Fall-back DST transition: two valid instants. Prefer the
            // earlier (standard interpretation voice callers expect) rather
            // than failing — ambiguity here is a clock quirk, not a
            // scheduling ambiguity.
            Ok(earlier.with_timezone(&Utc))
        }
        chrono::LocalResult::None => Err(InterpretError::Unparseable(format!(
            "{local} does not exist in the practice's local time (spring-forward gap)"
        ))),
    }
}

/// Resolve a bare weekday name or `next <weekday>` to the nearest matching
/// future date (today excluded) relative to `today`.
fn next_occurrence_of(today: NaiveDate, target: Weekday) -> NaiveDate {
    let mut candidate = today.succ_opt().unwrap_or(today);
    loop {
        if candidate.weekday() == target {
            return candidate;
        }
        candidate = candidate.succ_opt().unwrap_or(candidate);
    }
}

/// Translate a human time expression into a UTC instant or window.
///
/// Recognises, in order: ISO date-time, absolute month-day-time ("October 3
/// at 9 PM"), relative-day keywords (`today`, `tomorrow`, `next <weekday>`),
/// bare weekday names, relative offsets ("in two hours"), and part-of-day
/// keywords mapped to fixed local windows.
pub fn interpret(
    expression: &str,
    practice_tz: Tz,
    now_utc: DateTime<Utc>,
) -> Result<Interpretation, InterpretError> {
    let trimmed = expression.trim();
    let lower = trimmed.to_ascii_lowercase();

    if let Some(caps) = iso_regex().captures(trimmed) {
        let year: i32 = caps[1].parse().unwrap();
        let month: u32 = caps[2].parse().unwrap();
        let day: u32 = caps[3].parse().unwrap();
        let hour: u32 = caps[4].parse().unwrap();
        let minute: u32 = caps[5].parse().unwrap();
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| InterpretError::Unparseable(trimmed.to_string()))?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| InterpretError::Unparseable(trimmed.to_string()))?;
        let local = NaiveDateTime::new(date, time);
        return Ok(Interpretation::Instant(local_datetime_to_utc(practice_tz, local)?));
    }

    if let Some(caps) = absolute_month_day_regex().captures(trimmed) {
        let month = month_from_name(&caps[1])
            .ok_or_else(|| InterpretError::Unparseable(trimmed.to_string()))?;
        let day: u32 = caps[2].parse().unwrap();
        let hour: u32 = caps[3].parse().unwrap();
        let minute: u32 = caps.get(4).map(|m| m.as_str().parse().unwrap()).unwrap_or(0);
        let today = local_today(practice_tz, now_utc);
        let instant =
            resolve_absolute_month_day(practice_tz, today, month, day, hour, minute, &caps[5])?;
        return Ok(Interpretation::Instant(instant));
    }

    if let Some(caps) = full_localized_regex().captures(trimmed) {
        let hour: u32 = caps[1].parse().unwrap();
        let minute: u32 = caps[2].parse().unwrap();
        let month = month_from_name(&caps[4])
            .ok_or_else(|| InterpretError::Unparseable(trimmed.to_string()))?;
        let day: u32 = caps[5].parse().unwrap();
        let today = local_today(practice_tz, now_utc);
        let instant =
            resolve_absolute_month_day(practice_tz, today, month, day, hour, minute, &caps[3])?;
        return Ok(Interpretation::Instant(instant));
    }

    if lower == "today" {
        let today = local_today(practice_tz, now_utc);
        let (start, end) = day_bounds(today, practice_tz);
        return Ok(Interpretation::Window(start, end));
    }

    if lower == "tomorrow" {
        let tomorrow = local_today(practice_tz, now_utc)
            .succ_opt()
            .ok_or_else(|| InterpretError::Unparseable(trimmed.to_string()))?;
        let (start, end) = day_bounds(tomorrow, practice_tz);
        return Ok(Interpretation::Window(start, end));
    }

    if let Some(caps) = next_weekday_regex().captures(trimmed) {
        let weekday = weekday_from_name(&caps[1])
            .ok_or_else(|| InterpretError::Unparseable(trimmed.to_string()))?;
        let today = local_today(practice_tz, now_utc);
        let date = next_occurrence_of(today, weekday);
        let (start, end) = day_bounds(date, practice_tz);
        return Ok(Interpretation::Window(start, end));
    }

    if let Some(weekday) = weekday_from_name(&lower) {
        let today = local_today(practice_tz, now_utc);
        // A bare weekday name is ambiguous only in the sense that "this
        // Friday" vs "next Friday" could differ; we resolve to the next
        // calendar occurrence, consistent with `next <weekday>`.
        let date = next_occurrence_of(today, weekday);
        let (start, end) = day_bounds(date, practice_tz);
        return Ok(Interpretation::Window(start, end));
    }

    if let Some(caps) = relative_offset_regex().captures(trimmed) {
        let amount: i64 = caps[1].parse().unwrap();
        let unit = caps[2].to_ascii_lowercase();
        let delta = if unit.starts_with("hour") {
            Duration::hours(amount)
        } else {
            Duration::minutes(amount)
        };
        return Ok(Interpretation::Instant(now_utc + delta));
    }

    if let Some((start_local, end_local)) = part_of_day_window(&lower) {
        let today = local_today(practice_tz, now_utc);
        let start = local_datetime_to_utc(practice_tz, NaiveDateTime::new(today, start_local))?;
        let end = local_datetime_to_utc(practice_tz, NaiveDateTime::new(today, end_local))?;
        return Ok(Interpretation::Window(start, end));
    }

    Err(InterpretError::Unparseable(trimmed.to_string()))
}

/// Render a UTC instant in the practice's local timezone for display.
pub fn localize(instant_utc: DateTime<Utc>, practice_tz: Tz, style: LocalizeStyle) -> String {
    let local = instant_utc.with_timezone(&practice_tz);
    match style {
        LocalizeStyle::TimeOnly => local.format("%-I:%M %p").to_string(),
        LocalizeStyle::Full => local.format("%-I:%M %p on %A, %B %-d").to_string(),
        LocalizeStyle::DateOnly => local.format("%A, %B %-d").to_string(),
    }
}

/// The UTC window `[local_date 00:00, local_date+1 00:00)` in `practice_tz`.
/// Correctly spans 23-hour spring-forward days and 25-hour fall-back days
/// because both endpoints are resolved independently through
/// `TimeZone::from_local_datetime`.
pub fn day_bounds(local_date: NaiveDate, practice_tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_local = NaiveDateTime::new(local_date, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    let next_date = local_date.succ_opt().unwrap_or(local_date);
    let end_local = NaiveDateTime::new(next_date, NaiveTime::from_hms_opt(0, 0, 0).unwrap());

    let start = resolve_local_midnight(practice_tz, start_local);
    let end = resolve_local_midnight(practice_tz, end_local);
    (start, end)
}

/// Resolve a local midnight that may fall inside a spring-forward gap by
/// nudging forward to the first valid instant.
fn resolve_local_midnight(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earlier, _later) => earlier.with_timezone(&Utc),
        chrono::LocalResult::None => {
            let mut probe = local + Duration::minutes(1);
            loop {
                if let chrono::LocalResult::Single(dt) = tz.from_local_datetime(&probe) {
                    return dt.with_timezone(&Utc);
                }
                probe += Duration::minutes(1);
            }
        }
    }
}
