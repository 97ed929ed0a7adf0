/*!
 * Practice & VoiceAgent Models
 *
 * `Practice` is created and owned outside the Scheduling & Booking Core;
 * the core only reads its id and timezone. `VoiceAgent` is likewise
 * read-only from this core's perspective.
 */

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// A veterinary practice. Immutable from the SBC's perspective except for
/// `timezone`, which staff may update out-of-band.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Practice {
    pub id: Uuid,
    pub name: String,
    /// IANA timezone name, e.g. "America/Los_Angeles". The authoritative
    /// default for interpreting human-expressed times from this practice's
    /// voice line.
    pub timezone: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Practice {
    /// Parse `timezone` into a `chrono_tz::Tz`. Callers should have already
    /// validated this at creation time; this is a defensive re-parse for
    /// code paths that only hold the raw string.
    pub fn tz(&self) -> Result<Tz, String> {
        Tz::from_str(&self.timezone).map_err(|_| self.timezone.clone())
    }
}

/// Practice-scoped record binding a phone number to the practice and a
/// default timezone for voice interpretation. Read-only from the SBC's view.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct VoiceAgent {
    pub id: Uuid,
    pub practice_id: Uuid,
    pub phone_number: String,
    pub default_timezone: String,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_practice(tz: &str) -> Practice {
        Practice {
            id: Uuid::new_v4(),
            name: "Maple Street Veterinary".to_string(),
            timezone: tz.to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn valid_iana_timezone_parses() {
        let practice = sample_practice("America/Los_Angeles");
        assert!(practice.tz().is_ok());
    }

    #[test]
    fn invalid_timezone_fails_to_parse() {
        let practice = sample_practice("Mars/Olympus_Mons");
        assert!(practice.tz().is_err());
    }
}
