//! Time Helpers
//!
//! UTC timestamps for entity audit columns and a unit-conversion helper
//! used for the inference client's default timeout.

use chrono::{DateTime, Utc};

/// Current UTC timestamp.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert time units to total seconds.
///
/// Note: assumes 30 days per month for approximation.
pub const fn to_seconds(months: u64, days: u64, hours: u64, minutes: u64) -> u64 {
    const SECONDS_PER_MINUTE: u64 = 60;
    const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
    const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
    const SECONDS_PER_MONTH: u64 = 30 * SECONDS_PER_DAY;

    months * SECONDS_PER_MONTH
        + days * SECONDS_PER_DAY
        + hours * SECONDS_PER_HOUR
        + minutes * SECONDS_PER_MINUTE
}
