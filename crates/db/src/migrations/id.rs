//! Migration identifiers
//!
//! IDs are second-granularity timestamps (`YYYYMMDD_HHMMSS`). Because the format
//! is fixed-width, plain string ordering equals chronological ordering, which is
//! the only ordering the engine ever uses.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::RegistrationError;

/// chrono format string of a migration ID
pub const MIGRATION_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Width of a migration ID, and of the ledger's ID column
pub const MIGRATION_ID_LEN: usize = 15;

/// Loose shape check; calendar validity is checked separately
static MIGRATION_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^20[0-9]{6}_[0-9]{6}$").expect("migration ID pattern compiles"));

/// A validated migration identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MigrationId(String);

impl MigrationId {
    /// Validate and wrap `raw`
    pub fn parse(raw: &str) -> Result<Self, RegistrationError> {
        let invalid = || RegistrationError::InvalidId { id: raw.to_string() };

        if !MIGRATION_ID_PATTERN.is_match(raw) {
            return Err(invalid());
        }
        NaiveDateTime::parse_from_str(raw, MIGRATION_ID_FORMAT).map_err(|_| invalid())?;

        Ok(Self(raw.to_string()))
    }

    /// ID for the given instant
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format(MIGRATION_ID_FORMAT).to_string())
    }

    /// ID for the current time
    pub fn generate() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// ID for `now` that sorts strictly after `latest`.
    ///
    /// When `now` does not (same second, or a clock that went backwards) the ID
    /// is `latest` plus one second. Fails when the result would fall outside the
    /// accepted ID range.
    pub fn generate_after(now: DateTime<Utc>, latest: Option<&MigrationId>) -> Result<Self, RegistrationError> {
        let candidate = Self::from_datetime(now);
        let id = match latest {
            Some(latest) if candidate <= *latest => Self::from_datetime(latest.timestamp() + Duration::seconds(1)),
            _ => candidate,
        };
        Self::parse(id.as_str())
    }

    /// The instant encoded in this ID
    pub fn timestamp(&self) -> DateTime<Utc> {
        // Validated in `parse`, and `from_datetime` only produces valid IDs
        NaiveDateTime::parse_from_str(&self.0, MIGRATION_ID_FORMAT)
            .map(|naive| naive.and_utc())
            .unwrap_or_default()
    }

    /// Borrow the ID as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MigrationId {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MigrationId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for MigrationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_accepts_timestamp_ids() {
        assert!(MigrationId::parse("20250322_123456").is_ok());
        assert!(MigrationId::parse("20991231_235959").is_ok());
    }

    #[test]
    fn test_rejects_malformed_ids() {
        let malformed = [
            "",
            "latest",
            "SCHEMA_INIT",
            "20250322123456",
            "20250322-123456",
            "2025032_123456",
            "20250322_12345",
            "20250322_1234567",
            " 20250322_123456",
            "20250322_123456\n",
            "19991231_235959",
            "20251301_000000",
            "20250230_000000",
            "20250322_246000",
            "２0250322_123456",
        ];

        for raw in malformed {
            assert_eq!(
                MigrationId::parse(raw),
                Err(RegistrationError::InvalidId { id: raw.to_string() }),
                "expected {:?} to be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_ordering_is_chronological() {
        let earlier = MigrationId::parse("20241231_235959").unwrap();
        let later = MigrationId::parse("20250101_000000").unwrap();
        assert!(earlier < later);
        assert!(earlier.timestamp() < later.timestamp());
    }

    #[test]
    fn test_generate_matches_format() {
        let id = MigrationId::generate();
        assert_eq!(id.as_str().len(), MIGRATION_ID_LEN);
        assert!(MigrationId::parse(id.as_str()).is_ok());
    }

    #[test]
    fn test_generate_after_is_monotonic() {
        let now = Utc.with_ymd_and_hms(2025, 3, 22, 12, 34, 56).unwrap();
        let same_second = MigrationId::from_datetime(now);

        let next = MigrationId::generate_after(now, Some(&same_second)).unwrap();
        assert_eq!(next, "20250322_123457");

        let future = MigrationId::parse("20300101_000000").unwrap();
        let skewed = MigrationId::generate_after(now, Some(&future)).unwrap();
        assert_eq!(skewed, "20300101_000001");

        let fresh = MigrationId::generate_after(now, None).unwrap();
        assert_eq!(fresh, same_second);
    }

    #[test]
    fn test_generate_after_refuses_ids_past_range() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let last = MigrationId::parse("20991231_235959").unwrap();

        assert_eq!(
            MigrationId::generate_after(now, Some(&last)),
            Err(RegistrationError::InvalidId {
                id: "21000101_000000".to_string()
            })
        );

        let far_future = Utc.with_ymd_and_hms(2100, 6, 1, 0, 0, 0).unwrap();
        assert!(MigrationId::generate_after(far_future, None).is_err());
    }
}
