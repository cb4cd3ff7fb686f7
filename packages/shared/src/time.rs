//! Time-related utilities.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

/// JST is UTC+9
const JST: FixedOffset = FixedOffset::east_opt(9 * 3600).unwrap();

/// Get current Unix timestamp in JST (milliseconds)
pub fn get_jst_timestamp() -> i64 {
    let now_jst: DateTime<FixedOffset> = Utc::now().with_timezone(&JST);
    now_jst.timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to JST RFC 3339 format
///
/// Returns an empty string when the timestamp is out of chrono's range.
pub fn timestamp_to_jst_rfc3339(timestamp_millis: i64) -> String {
    JST
        .timestamp_millis_opt(timestamp_millis)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}
