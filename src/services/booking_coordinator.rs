/*!
 * Booking Coordinator
 *
 * Serialises conflict validation and appointment mutation within a single
 * transaction so availability can never drift from appointments. Two
 * concurrent creates targeting the same vet/time must not both succeed;
 * this is enforced either by `SERIALIZABLE` isolation with retry on
 * serialization failure, or by an explicit advisory lock keyed on
 * `(vet_id, floor(appointment_at / hour))`, selected via
 * `BookingConfig::lock_strategy`.
 */

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::config::{BookingConfig, LockStrategy};
use crate::models::{
    Appointment, AppointmentEvent, AppointmentEventPayload, AppointmentStatus, Practice,
};
use crate::services::availability_store::AvailabilityStore;
use crate::services::events::EventPublisher;
use crate::utils::errors::{AppError, Result};
use crate::utils::retry::retry_transient;

pub struct CreateAppointmentParams {
    pub practice_id: Uuid,
    pub vet_id: Option<Uuid>,
    pub appointment_at_utc: DateTime<Utc>,
    pub duration_minutes: i32,
    pub pet_ids: Vec<Uuid>,
    pub owner_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub created_by_user_id: Uuid,
    pub emergency_override: bool,
}

pub struct ReschedulePatch {
    pub new_at_utc: Option<DateTime<Utc>>,
    pub new_duration_minutes: Option<i32>,
    pub new_vet_id: Option<Uuid>,
    pub emergency_override: bool,
}

pub struct BookingCoordinator {
    pool: PgPool,
    store: Arc<AvailabilityStore>,
    events: Arc<dyn EventPublisher>,
    config: BookingConfig,
}

impl BookingCoordinator {
    pub fn new(
        pool: PgPool,
        store: Arc<AvailabilityStore>,
        events: Arc<dyn EventPublisher>,
        config: BookingConfig,
    ) -> Self {
        Self {
            pool,
            store,
            events,
            config,
        }
    }

    /// Create a new appointment, validating practice hours and vet
    /// availability unless `emergency_override` is set.
    pub async fn create(&self, params: CreateAppointmentParams) -> Result<Appointment> {
        retry_transient(|| self.create_once(&params)).await
    }

    async fn create_once(&self, params: &CreateAppointmentParams) -> Result<Appointment> {
        let t0 = params.appointment_at_utc;
        let t1 = t0 + Duration::minutes(params.duration_minutes as i64);

        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        self.set_transaction_isolation(&mut tx).await?;

        if let Some(vet_id) = params.vet_id {
            self.acquire_advisory_lock_if_configured(&mut tx, vet_id, t0).await?;
        }

        if !params.emergency_override {
            self.check_practice_open(&mut tx, params.practice_id, t0, t1).await?;
        }

        if !params.emergency_override {
            if let Some(vet_id) = params.vet_id {
                self.check_vet_available(&mut tx, params.practice_id, vet_id, t0, t1)
                    .await?;
            }
        }

        let mut notes = params.notes.clone();
        if let Some(vet_id) = params.vet_id {
            let conflicts =
                AvailabilityStore::count_conflicting_appointments(&mut tx, vet_id, (t0, t1), None)
                    .await?;
            if conflicts > 0 {
                if params.emergency_override {
                    let note = "Booked as an emergency override despite an existing conflict.";
                    notes = Some(match notes {
                        Some(existing) => format!("{existing}\n{note}"),
                        None => note.to_string(),
                    });
                } else {
                    return Err(AppError::SlotConflict(format!(
                        "vet {vet_id} already has an appointment overlapping the requested time"
                    )));
                }
            }
        }

        if params.pet_ids.is_empty() {
            return Err(AppError::Validation("at least one pet is required".to_string()));
        }

        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (
                id, practice_id, assigned_vet_user_id, appointment_at, duration_minutes,
                status, pet_owner_id, pet_ids, title, notes, created_by_user_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, 'SCHEDULED', $6, $7, $8, $9, $10, now(), now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.practice_id)
        .bind(params.vet_id)
        .bind(t0)
        .bind(params.duration_minutes)
        .bind(params.owner_id)
        .bind(&params.pet_ids)
        .bind(&params.title)
        .bind(&notes)
        .bind(params.created_by_user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;

        self.events
            .publish(AppointmentEvent::Created(AppointmentEventPayload::from(&appointment)))
            .await;

        Ok(appointment)
    }

    /// Reschedule an appointment: load under row lock, compute the new
    /// interval, re-run the create-time validation against it (excluding
    /// this appointment from the conflict set), then update in place.
    pub async fn reschedule(&self, appointment_id: Uuid, patch: ReschedulePatch) -> Result<Appointment> {
        retry_transient(|| self.reschedule_once(appointment_id, &patch)).await
    }

    async fn reschedule_once(
        &self,
        appointment_id: Uuid,
        patch: &ReschedulePatch,
    ) -> Result<Appointment> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        self.set_transaction_isolation(&mut tx).await?;

        let existing = AvailabilityStore::lock_appointment(&mut tx, appointment_id).await?;
        if existing.status.is_terminal() {
            return Err(AppError::InvalidTransition(format!(
                "appointment {appointment_id} is already {:?} and cannot be rescheduled",
                existing.status
            )));
        }

        let new_at = patch.new_at_utc.unwrap_or(existing.appointment_at);
        let new_duration = patch.new_duration_minutes.unwrap_or(existing.duration_minutes);
        let new_vet = patch.new_vet_id.or(existing.assigned_vet_user_id);
        let t0 = new_at;
        let t1 = t0 + Duration::minutes(new_duration as i64);

        if let Some(vet_id) = new_vet {
            self.acquire_advisory_lock_if_configured(&mut tx, vet_id, t0).await?;
        }

        if !patch.emergency_override {
            self.check_practice_open(&mut tx, existing.practice_id, t0, t1).await?;
            if let Some(vet_id) = new_vet {
                self.check_vet_available(&mut tx, existing.practice_id, vet_id, t0, t1)
                    .await?;
            }
        }

        if let Some(vet_id) = new_vet {
            let conflicts = AvailabilityStore::count_conflicting_appointments(
                &mut tx,
                vet_id,
                (t0, t1),
                Some(appointment_id),
            )
            .await?;
            if conflicts > 0 && !patch.emergency_override {
                return Err(AppError::SlotConflict(format!(
                    "vet {vet_id} already has an appointment overlapping the requested time"
                )));
            }
        }

        let updated = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET appointment_at = $1,
                duration_minutes = $2,
                assigned_vet_user_id = $3,
                updated_at = now()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(t0)
        .bind(new_duration)
        .bind(new_vet)
        .bind(appointment_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;

        self.events
            .publish(AppointmentEvent::Rescheduled(AppointmentEventPayload::from(&updated)))
            .await;

        Ok(updated)
    }

    /// Cancel an appointment. Idempotent: cancelling an already-cancelled
    /// appointment succeeds without modification.
    pub async fn cancel(&self, appointment_id: Uuid, reason: Option<String>) -> Result<Appointment> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let existing = AvailabilityStore::lock_appointment(&mut tx, appointment_id).await?;
        if existing.status == AppointmentStatus::Cancelled {
            tx.commit().await.map_err(AppError::from)?;
            return Ok(existing);
        }
        if !existing.status.can_transition_to(&AppointmentStatus::Cancelled) {
            return Err(AppError::InvalidTransition(format!(
                "appointment {appointment_id} in status {:?} cannot be cancelled",
                existing.status
            )));
        }

        let notes = match reason {
            Some(r) => match existing.notes.clone() {
                Some(existing_notes) => Some(format!("{existing_notes}\nCancelled: {r}")),
                None => Some(format!("Cancelled: {r}")),
            },
            None => existing.notes.clone(),
        };

        let updated = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET status = 'CANCELLED', notes = $1, updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(&notes)
        .bind(appointment_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;

        self.events
            .publish(AppointmentEvent::Cancelled(AppointmentEventPayload::from(&updated)))
            .await;

        Ok(updated)
    }

    /// Transition an appointment between lifecycle statuses (CONFIRMED,
    /// IN_PROGRESS, COMPLETED, NO_SHOW), rejecting illegal transitions.
    pub async fn transition(&self, appointment_id: Uuid, new_status: AppointmentStatus) -> Result<Appointment> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let existing = AvailabilityStore::lock_appointment(&mut tx, appointment_id).await?;
        if !existing.status.can_transition_to(&new_status) {
            return Err(AppError::InvalidTransition(format!(
                "appointment {appointment_id} cannot move from {:?} to {:?}",
                existing.status, new_status
            )));
        }

        let updated = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET status = $1, updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(new_status)
        .bind(appointment_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;

        self.events
            .publish(AppointmentEvent::StatusChanged(AppointmentEventPayload::from(&updated)))
            .await;

        Ok(updated)
    }

    async fn set_transaction_isolation(&self, tx: &mut Transaction<'_, Postgres>) -> Result<()> {
        if self.config.lock_strategy == LockStrategy::Serializable {
            sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                .execute(&mut **tx)
                .await
                .map_err(AppError::from)?;
        }
        Ok(())
    }

    /// Under the advisory-lock strategy, take a transaction-scoped
    /// `pg_advisory_xact_lock` keyed on `(vet_id, floor(appointment_at / hour))`
    /// so concurrent creates for the same vet/hour serialise instead of
    /// racing through the conflict check.
    async fn acquire_advisory_lock_if_configured(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        vet_id: Uuid,
        instant: DateTime<Utc>,
    ) -> Result<()> {
        if self.config.lock_strategy != LockStrategy::Advisory {
            return Ok(());
        }
        let hour_bucket = instant.timestamp() / 3600;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0), $2)")
            .bind(vet_id.to_string())
            .bind(hour_bucket)
            .execute(&mut **tx)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn check_practice_open(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        practice_id: Uuid,
        t0: DateTime<Utc>,
        t1: DateTime<Utc>,
    ) -> Result<()> {
        let practice = sqlx::query_as::<_, Practice>("SELECT * FROM practices WHERE id = $1")
            .bind(practice_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("practice {practice_id}")))?;

        let tz = practice
            .tz()
            .map_err(|raw| AppError::UnknownTimezone(raw))?;

        let local_date = t0.with_timezone(&tz).date_naive();
        let day_of_week = chrono::Datelike::weekday(&local_date).num_days_from_monday() as i16 + 1;

        let hours = sqlx::query_as::<_, crate::models::PracticeHours>(
            r#"
            SELECT * FROM practice_hours
            WHERE practice_id = $1 AND day_of_week = $2 AND is_active = TRUE
              AND effective_from <= $3
              AND (effective_until IS NULL OR effective_until >= $3)
            ORDER BY effective_from DESC
            LIMIT 1
            "#,
        )
        .bind(practice_id)
        .bind(day_of_week)
        .bind(local_date)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::from)?;

        let Some(hours) = hours else {
            return Err(AppError::PracticeClosed(format!(
                "practice {practice_id} has no hours on {local_date}"
            )));
        };

        let Some((open_utc, close_utc)) = hours.open_close_utc(local_date, tz) else {
            return Err(AppError::PracticeClosed(format!(
                "practice {practice_id} is closed on {local_date}"
            )));
        };

        if t0 < open_utc || t1 > close_utc {
            return Err(AppError::PracticeClosed(format!(
                "requested time falls outside practice hours on {local_date}"
            )));
        }

        Ok(())
    }

    async fn check_vet_available(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        practice_id: Uuid,
        vet_id: Uuid,
        t0: DateTime<Utc>,
        t1: DateTime<Utc>,
    ) -> Result<()> {
        let enclosing: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT availability_type FROM vet_availability
            WHERE practice_id = $1 AND vet_user_id = $2 AND is_active = TRUE
              AND availability_type IN ('AVAILABLE', 'EMERGENCY_ONLY')
              AND start_at <= $3 AND end_at >= $4
            LIMIT 1
            "#,
        )
        .bind(practice_id)
        .bind(vet_id)
        .bind(t0)
        .bind(t1)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::from)?;

        if enclosing.is_none() {
            return Err(AppError::VetUnavailable(format!(
                "vet {vet_id} has no availability window enclosing the requested time"
            )));
        }

        Ok(())
    }
}
