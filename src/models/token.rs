// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava credential model.

use chrono::{DateTime, Duration, Utc};

/// Margin before token expiration when we proactively refresh (5 minutes).
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// The stored Strava OAuth credential (single row).
#[derive(Debug, Clone, PartialEq)]
pub struct StravaToken {
    /// Strava athlete ID
    pub athlete_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry (Unix timestamp)
    pub expires_at: i64,
    /// Completion time of the last successful sync
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl StravaToken {
    /// Whether the access token is expired (or will be within the refresh margin).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) >= self.expires_at_utc()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn expires_at_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.expires_at, 0).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token(expires_at: i64) -> StravaToken {
        StravaToken {
            athlete_id: 12345,
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
            last_sync_at: None,
        }
    }

    #[test]
    fn test_token_is_expired() {
        let expired = token(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap().timestamp());
        assert!(expired.is_expired());

        let valid = token(Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap().timestamp());
        assert!(!valid.is_expired());
    }

    #[test]
    fn test_token_expiring_within_margin_counts_as_expired() {
        let now = Utc.with_ymd_and_hms(2025, 1, 20, 12, 0, 0).unwrap();
        assert!(token(now.timestamp() + 60).is_expired_at(now));
        assert!(!token(now.timestamp() + 3600).is_expired_at(now));
    }
}
