//! Timestamp utilities
//!
//! All persisted timestamps are UTC milliseconds since the epoch.

use chrono::{DateTime, TimeZone, Utc};

/// Current UTC time in epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds back to a UTC datetime
///
/// Out-of-range values fall back to the epoch rather than panicking.
pub fn from_ms(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
