/*!
 * Availability Store
 *
 * Durable storage and range querying of the three temporal entities:
 * `PracticeHours`, `VetAvailability`, and `Appointment`. Every overlap check
 * is pushed into PostgreSQL via `tstzrange(...) && tstzrange(...)`, the same
 * idiom the appointment scheduling logic this core is drawn from uses for
 * conflict detection, rather than fetched and intersected in Rust.
 *
 * No row-level-security session variables are set here: unlike the wider
 * system this core is extracted from, authorisation is handled entirely
 * upstream of the SBC (see DESIGN.md).
 */

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, PracticeHours, VetAvailability};
use crate::utils::{AppError, Result};

/// Default statuses excluded from conflict-check queries.
const TERMINAL_STATUSES: [&str; 3] = ["CANCELLED", "NO_SHOW", "COMPLETED"];

#[derive(Clone)]
pub struct AvailabilityStore {
    pool: PgPool,
}

impl AvailabilityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Resolve the single active `PracticeHours` record for the weekday of
    /// `local_date` whose effective range covers it. Returns `None` when the
    /// practice is closed that day.
    pub async fn get_practice_hours(
        &self,
        practice_id: Uuid,
        local_date: NaiveDate,
    ) -> Result<Option<PracticeHours>> {
        let day_of_week = local_date.weekday().num_days_from_monday() as i16 + 1;
        let hours = sqlx::query_as::<_, PracticeHours>(
            r#"
            SELECT * FROM practice_hours
            WHERE practice_id = $1
              AND day_of_week = $2
              AND is_active = TRUE
              AND effective_from <= $3
              AND (effective_until IS NULL OR effective_until >= $3)
            ORDER BY effective_from DESC
            LIMIT 1
            "#,
        )
        .bind(practice_id)
        .bind(day_of_week)
        .bind(local_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(hours)
    }

    /// All active `VetAvailability` windows overlapping `window_utc`. When
    /// `vet_id` is `None`, returns windows for every vet in the practice.
    pub async fn list_vet_availability(
        &self,
        practice_id: Uuid,
        vet_id: Option<Uuid>,
        window_utc: (DateTime<Utc>, DateTime<Utc>),
    ) -> Result<Vec<VetAvailability>> {
        let (start, end) = window_utc;
        let rows = if let Some(vet_id) = vet_id {
            sqlx::query_as::<_, VetAvailability>(
                r#"
                SELECT * FROM vet_availability
                WHERE practice_id = $1
                  AND vet_user_id = $2
                  AND is_active = TRUE
                  AND tstzrange(start_at, end_at) && tstzrange($3, $4)
                ORDER BY start_at
                "#,
            )
            .bind(practice_id)
            .bind(vet_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, VetAvailability>(
                r#"
                SELECT * FROM vet_availability
                WHERE practice_id = $1
                  AND is_active = TRUE
                  AND tstzrange(start_at, end_at) && tstzrange($2, $3)
                ORDER BY vet_user_id, start_at
                "#,
            )
            .bind(practice_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows)
    }

    /// Appointments intersecting `window_utc`, filtered by `include_statuses`.
    /// By default (empty slice) excludes CANCELLED/NO_SHOW/COMPLETED, the set
    /// used by conflict checks.
    pub async fn list_appointments(
        &self,
        practice_id: Uuid,
        vet_id: Option<Uuid>,
        window_utc: (DateTime<Utc>, DateTime<Utc>),
        include_statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>> {
        let (start, end) = window_utc;
        let status_filter: Vec<String> = if include_statuses.is_empty() {
            AppointmentStatus::all_non_terminal_codes()
        } else {
            include_statuses
                .iter()
                .map(|s| s.as_db_code().to_string())
                .collect()
        };

        let rows = if let Some(vet_id) = vet_id {
            sqlx::query_as::<_, Appointment>(
                r#"
                SELECT * FROM appointments
                WHERE practice_id = $1
                  AND assigned_vet_user_id = $2
                  AND status = ANY($3)
                  AND tstzrange(appointment_at, appointment_at + (duration_minutes || ' minutes')::interval)
                      && tstzrange($4, $5)
                ORDER BY appointment_at
                "#,
            )
            .bind(practice_id)
            .bind(vet_id)
            .bind(&status_filter)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Appointment>(
                r#"
                SELECT * FROM appointments
                WHERE practice_id = $1
                  AND status = ANY($2)
                  AND tstzrange(appointment_at, appointment_at + (duration_minutes || ' minutes')::interval)
                      && tstzrange($3, $4)
                ORDER BY appointment_at
                "#,
            )
            .bind(practice_id)
            .bind(&status_filter)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows)
    }

    /// Count non-terminal appointments for `vet_id` overlapping `window_utc`,
    /// optionally excluding one appointment (for reschedule conflict checks).
    /// Must run inside the Booking Coordinator's transaction.
    pub async fn count_conflicting_appointments(
        tx: &mut Transaction<'_, Postgres>,
        vet_id: Uuid,
        window_utc: (DateTime<Utc>, DateTime<Utc>),
        exclude_id: Option<Uuid>,
    ) -> Result<i64> {
        let (start, end) = window_utc;
        let count = if let Some(exclude_id) = exclude_id {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM appointments
                WHERE assigned_vet_user_id = $1
                  AND id != $2
                  AND status NOT IN ('CANCELLED', 'NO_SHOW', 'COMPLETED')
                  AND tstzrange(appointment_at, appointment_at + (duration_minutes || ' minutes')::interval)
                      && tstzrange($3, $4)
                "#,
            )
            .bind(vet_id)
            .bind(exclude_id)
            .bind(start)
            .bind(end)
            .fetch_one(&mut **tx)
            .await?
        } else {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM appointments
                WHERE assigned_vet_user_id = $1
                  AND status NOT IN ('CANCELLED', 'NO_SHOW', 'COMPLETED')
                  AND tstzrange(appointment_at, appointment_at + (duration_minutes || ' minutes')::interval)
                      && tstzrange($2, $3)
                "#,
            )
            .bind(vet_id)
            .bind(start)
            .bind(end)
            .fetch_one(&mut **tx)
            .await?
        };

        Ok(count)
    }

    /// Load one appointment under `FOR UPDATE` row lock within `tx`. Used by
    /// the Booking Coordinator before reschedule/cancel/transition.
    pub async fn lock_appointment(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Appointment> {
        let appointment = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))?;

        Ok(appointment)
    }

    pub async fn fetch_appointment(&self, id: Uuid) -> Result<Appointment> {
        sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))
    }
}

impl AppointmentStatus {
    fn as_db_code(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::InProgress => "IN_PROGRESS",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }

    fn all_non_terminal_codes() -> Vec<String> {
        ["SCHEDULED", "CONFIRMED", "IN_PROGRESS"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}
