/*!
 * Domain Event Publisher
 *
 * Appointment lifecycle events are published after commit. This core has no
 * message bus of its own — the default publisher just logs via `tracing`.
 * A real deployment would swap in an implementation that pushes onto a
 * queue (SQS, NATS, etc.); that wiring lives outside this crate.
 */

use crate::models::AppointmentEvent;
use async_trait::async_trait;

/// Sink for domain events emitted by the Booking Coordinator after commit.
/// Publish failures are logged, never propagated — a dropped notification
/// must not roll back a committed booking.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: AppointmentEvent);
}

/// Default publisher: structured log line per event, no external transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: AppointmentEvent) {
        match &event {
            AppointmentEvent::Created(p) => {
                tracing::info!(appointment_id = %p.appointment_id, "appointment.created")
            }
            AppointmentEvent::Rescheduled(p) => {
                tracing::info!(appointment_id = %p.appointment_id, "appointment.rescheduled")
            }
            AppointmentEvent::Cancelled(p) => {
                tracing::info!(appointment_id = %p.appointment_id, "appointment.cancelled")
            }
            AppointmentEvent::StatusChanged(p) => {
                tracing::info!(appointment_id = %p.appointment_id, status = ?p.status, "appointment.status_changed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentEventPayload, AppointmentStatus};
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn tracing_publisher_accepts_every_event_variant() {
        let publisher = TracingEventPublisher;
        let payload = AppointmentEventPayload {
            appointment_id: Uuid::new_v4(),
            practice_id: Uuid::new_v4(),
            vet_user_id: None,
            appointment_at_utc: Utc::now(),
            duration_minutes: 30,
            status: AppointmentStatus::Scheduled,
            updated_at: Utc::now(),
        };
        publisher.publish(AppointmentEvent::Created(payload.clone())).await;
        publisher.publish(AppointmentEvent::Rescheduled(payload.clone())).await;
        publisher.publish(AppointmentEvent::Cancelled(payload.clone())).await;
        publisher.publish(AppointmentEvent::StatusChanged(payload)).await;
    }
}
