/*!
 * Error Handling
 *
 * Defines the closed error taxonomy surfaced identically by the staff HTTP
 * surface and the voice function-call surface, and its mapping onto HTTP
 * responses.
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Closed error taxonomy.
///
/// Every variant maps to exactly one of the five classes named by the
/// error-handling design: input, business, transient, infrastructure, or
/// authorisation (authorisation errors are handled upstream and never
/// constructed here).
#[derive(Debug)]
pub enum AppError {
    // --- Input errors: reported to caller, never retried ---
    Unparseable(String),
    Ambiguous { message: String, candidates: Vec<String> },
    UnknownTimezone(String),
    PastInstant(String),
    InvalidDuration(String),
    UnknownFunction(String),
    Validation(String),

    // --- Business errors ---
    PracticeClosed(String),
    VetUnavailable(String),
    SlotConflict(String),
    InvalidTransition(String),
    NoHours,
    NoVetAvailability,
    NotFound(String),

    // --- Transient errors: retried internally; surfaced only if exhausted ---
    TryAgain(String),

    // --- Infrastructure errors ---
    StoreUnavailable(String),
    DeadlineExceeded,
    Database(sqlx::Error),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unparseable(msg) => write!(f, "Unparseable: {}", msg),
            Self::Ambiguous { message, .. } => write!(f, "Ambiguous: {}", message),
            Self::UnknownTimezone(msg) => write!(f, "Unknown timezone: {}", msg),
            Self::PastInstant(msg) => write!(f, "Past instant: {}", msg),
            Self::InvalidDuration(msg) => write!(f, "Invalid duration: {}", msg),
            Self::UnknownFunction(msg) => write!(f, "Unknown function: {}", msg),
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::PracticeClosed(msg) => write!(f, "Practice closed: {}", msg),
            Self::VetUnavailable(msg) => write!(f, "Vet unavailable: {}", msg),
            Self::SlotConflict(msg) => write!(f, "Slot conflict: {}", msg),
            Self::InvalidTransition(msg) => write!(f, "Invalid transition: {}", msg),
            Self::NoHours => write!(f, "No hours configured for the requested date(s)"),
            Self::NoVetAvailability => write!(f, "No vet availability for the requested window"),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::TryAgain(msg) => write!(f, "Try again: {}", msg),
            Self::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            Self::DeadlineExceeded => write!(f, "Deadline exceeded"),
            Self::Database(err) => write!(f, "Database error: {}", err),
            Self::Internal(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Convert SQLx errors to AppError, routing serialization failures and
/// deadlocks towards the transient `TryAgain` path (they are expected to
/// have already been retried by the caller) and everything else towards
/// `StoreUnavailable`/`Database`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.code().as_deref() {
                Some("40001") | Some("40P01") => {
                    tracing::warn!("Transactional conflict exhausted retries: {:?}", err);
                    return Self::TryAgain("serialization conflict".to_string());
                }
                Some("23P01") => {
                    // GiST exclusion constraint violation — the database-level
                    // backstop against double-booking caught what the
                    // application-level check missed under heavy concurrency.
                    tracing::warn!("Exclusion constraint violation: {:?}", err);
                    return Self::SlotConflict("overlapping appointment".to_string());
                }
                _ => {}
            }
        }
        tracing::error!("Database error: {:?}", err);
        Self::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::Unparseable(msg) => (StatusCode::BAD_REQUEST, "UNPARSEABLE", msg),
            Self::Ambiguous { message, candidates } => {
                let body = Json(json!({
                    "error": "AMBIGUOUS",
                    "message": message,
                    "candidates": candidates,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            Self::UnknownTimezone(msg) => (StatusCode::BAD_REQUEST, "UNKNOWN_TIMEZONE", msg),
            Self::PastInstant(msg) => (StatusCode::BAD_REQUEST, "PAST_INSTANT", msg),
            Self::InvalidDuration(msg) => (StatusCode::BAD_REQUEST, "INVALID_DURATION", msg),
            Self::UnknownFunction(msg) => (StatusCode::BAD_REQUEST, "UNKNOWN_FUNCTION", msg),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            Self::PracticeClosed(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "PRACTICE_CLOSED", msg),
            Self::VetUnavailable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "VET_UNAVAILABLE", msg),
            Self::SlotConflict(msg) => (StatusCode::CONFLICT, "SLOT_CONFLICT", msg),
            Self::InvalidTransition(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_TRANSITION", msg)
            }
            Self::NoHours => (
                StatusCode::OK,
                "NO_HOURS",
                "the practice has no hours configured for the requested date(s)".to_string(),
            ),
            Self::NoVetAvailability => (
                StatusCode::OK,
                "NO_VET_AVAILABILITY",
                "our veterinarians may not have scheduled their hours yet — would you like a callback?"
                    .to_string(),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            Self::TryAgain(msg) => (StatusCode::CONFLICT, "TRY_AGAIN", msg),
            Self::StoreUnavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_UNAVAILABLE",
                    "our system is temporarily unable to confirm — would you like a callback?"
                        .to_string(),
                )
            }
            Self::DeadlineExceeded => (
                StatusCode::GATEWAY_TIMEOUT,
                "DEADLINE_EXCEEDED",
                "the request took too long to complete".to_string(),
            ),
            Self::Database(ref err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_UNAVAILABLE",
                    "an internal database error occurred".to_string(),
                )
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "an internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_code,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::SlotConflict("vet busy".to_string());
        assert_eq!(err.to_string(), "Slot conflict: vet busy");

        let err = AppError::NotFound("appointment not found".to_string());
        assert_eq!(err.to_string(), "Not found: appointment not found");
    }

    #[test]
    fn test_no_vet_availability_display() {
        let err = AppError::NoVetAvailability;
        assert_eq!(
            err.to_string(),
            "No vet availability for the requested window"
        );
    }

    #[test]
    fn test_ambiguous_display_uses_message_only() {
        let err = AppError::Ambiguous {
            message: "Friday could mean several dates".to_string(),
            candidates: vec!["2025-10-03".to_string(), "2025-10-10".to_string()],
        };
        assert_eq!(err.to_string(), "Ambiguous: Friday could mean several dates");
    }
}
