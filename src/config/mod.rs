/*!
 * Configuration Module
 *
 * Handles application configuration loading from environment variables
 * and provides structured access to configuration values.
 */

use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Locking strategy used by the Booking Coordinator to serialise conflict
/// validation against concurrent creates for the same vet/time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrategy {
    /// `SERIALIZABLE` transaction isolation; conflicts surface as retryable
    /// serialization failures.
    Serializable,
    /// Explicit `pg_advisory_xact_lock` keyed on (vet_id, hour bucket).
    Advisory,
}

impl LockStrategy {
    fn from_env_str(s: &str) -> Self {
        match s {
            "advisory" => Self::Advisory,
            _ => Self::Serializable,
        }
    }
}

/// Scheduling and booking configuration specific to this core.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Default slot granularity in minutes when a request omits it.
    pub default_slot_minutes: i64,
    pub lock_strategy: LockStrategy,
    /// Hard deadline for voice function-calls, per §5.
    pub voice_request_deadline_ms: u64,
    /// Hard deadline for staff HTTP calls, per §5.
    pub staff_request_deadline_ms: u64,
    /// Deadline for after-commit webhook/event dispatch; does not block commit.
    pub webhook_deadline_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing
    /// or contain invalid values.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
                environment: std::env::var("ENVIRONMENT")
                    .unwrap_or_else(|_| "development".to_string()),
            },

            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .unwrap_or(20),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
                acquire_timeout: Duration::from_secs(
                    std::env::var("DATABASE_CONNECT_TIMEOUT")
                        .unwrap_or_else(|_| "30".to_string())
                        .parse()
                        .unwrap_or(30),
                ),
                idle_timeout: Duration::from_secs(
                    std::env::var("DATABASE_IDLE_TIMEOUT")
                        .unwrap_or_else(|_| "600".to_string())
                        .parse()
                        .unwrap_or(600),
                ),
                max_lifetime: Duration::from_secs(
                    std::env::var("DATABASE_MAX_LIFETIME")
                        .unwrap_or_else(|_| "1800".to_string())
                        .parse()
                        .unwrap_or(1800),
                ),
            },

            booking: BookingConfig {
                default_slot_minutes: std::env::var("DEFAULT_SLOT_MINUTES")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
                lock_strategy: LockStrategy::from_env_str(
                    &std::env::var("BOOKING_LOCK_STRATEGY")
                        .unwrap_or_else(|_| "serializable".to_string()),
                ),
                voice_request_deadline_ms: std::env::var("VOICE_REQUEST_DEADLINE_MS")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .unwrap_or(8000),
                staff_request_deadline_ms: std::env::var("STAFF_REQUEST_DEADLINE_MS")
                    .unwrap_or_else(|_| "30000".to_string())
                    .parse()
                    .unwrap_or(30000),
                webhook_deadline_ms: std::env::var("WEBHOOK_DEADLINE_MS")
                    .unwrap_or_else(|_| "10000".to_string())
                    .parse()
                    .unwrap_or(10000),
            },
        };

        Ok(config)
    }
}
