/*!
 * HTTP Request Handlers Module
 *
 * Contains all HTTP request handlers for the API endpoints: staff-facing
 * appointment CRUD and slot discovery, and the voice function-call surface.
 */

pub mod appointments;
pub mod scheduling;
pub mod voice;

pub use appointments::{
    cancel_appointment, create_appointment, get_appointment, list_appointments,
    transition_appointment, update_appointment,
};
pub use scheduling::get_available_slots;
pub use voice::handle_voice_function_call;
