/*!
 * Services Module
 *
 * Contains the four scheduling components (Availability Store, Slot Engine,
 * Booking Coordinator, Intent Gateway) plus the domain event publisher.
 */

pub mod availability_store;
pub mod booking_coordinator;
pub mod events;
pub mod intent_gateway;
pub mod slot_engine;

pub use availability_store::AvailabilityStore;
pub use booking_coordinator::{BookingCoordinator, CreateAppointmentParams, ReschedulePatch};
pub use events::{EventPublisher, TracingEventPublisher};
pub use intent_gateway::{IntentGateway, LocalisedSlot, VoiceSlotResult};
pub use slot_engine::{SlotEngine, SlotQuery};
