/*!
 * Request Context
 *
 * Holds per-request metadata (correlation id, deadline) that is attached by
 * the `deadline` middleware and passed through to handlers and services.
 * There is no authenticated-user concept in this core, so unlike the source
 * repository's request context this carries no identity fields.
 */

use tokio::time::Instant;
use uuid::Uuid;

/// Request context propagated via an axum extension. `deadline` is the
/// absolute point by which the request must complete; handlers race their
/// Booking Coordinator / Slot Engine calls against it with
/// `tokio::time::timeout_at`.
#[derive(Clone, Debug)]
pub struct RequestContext {
    /// Unique request identifier for tracing
    pub request_id: Uuid,
    /// Absolute deadline this request must complete by.
    pub deadline: Instant,
}

impl RequestContext {
    pub fn new(deadline: Instant) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            deadline,
        }
    }

    /// A context with no meaningful deadline, for code paths (tests, background
    /// jobs) that run outside the HTTP request lifecycle.
    pub fn empty() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            deadline: Instant::now() + std::time::Duration::from_secs(3600),
        }
    }
}
