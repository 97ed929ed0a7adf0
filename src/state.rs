/*!
 * Application State
 *
 * The handle threaded through every Axum extractor: a database pool plus
 * the four scheduling components, already wired together, plus the booking
 * configuration needed to pick per-surface request deadlines.
 */

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BookingConfig;
use crate::services::{AvailabilityStore, BookingCoordinator, IntentGateway, SlotEngine};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: Arc<AvailabilityStore>,
    pub slot_engine: Arc<SlotEngine>,
    pub coordinator: Arc<BookingCoordinator>,
    pub gateway: Arc<IntentGateway>,
    pub booking_config: BookingConfig,
}
