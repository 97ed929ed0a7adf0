/*!
 * Data Models Module
 *
 * Contains the domain types shared across the Availability Store, Slot
 * Engine, Booking Coordinator, and Intent Gateway, plus request/response
 * DTOs for the HTTP surfaces.
 */

pub mod appointment;
pub mod practice;
pub mod practice_hours;
pub mod request_context;
pub mod slot;
pub mod vet_availability;
pub mod voice;

pub use appointment::{
    Appointment, AppointmentEvent, AppointmentEventPayload, AppointmentStatus,
    CancelAppointmentRequest, CreateAppointmentRequest, UpdateAppointmentRequest,
};
pub use practice::{Practice, VoiceAgent};
pub use practice_hours::{DayOfWeek, PracticeHours};
pub use request_context::RequestContext;
pub use slot::{Slot, SlotClassification, SlotQueryReason, SlotQueryResult, TimePreference};
pub use vet_availability::{AvailabilityType, VetAvailability};
pub use voice::{
    BookAppointmentArgs, CancelAppointmentArgs, GetAvailableTimesArgs, VoiceBookingConfirmation,
    VoiceFunctionCall, VoiceFunctionCallEnvelope, VoiceFunctionResult,
};
