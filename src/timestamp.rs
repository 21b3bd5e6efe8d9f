//! Date reconciliation for scraped and feed-provided timestamps
//!
//! Blogs publish dates in many shapes. Every value is normalized into a naive
//! local timestamp (the machine's local zone), the form the store keeps.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};

/// Local date-time with seconds, `T` or space separated variants
const LOCAL_ISO_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const LOCAL_SPACE_SECONDS: &str = "%Y-%m-%d %H:%M:%S";
const LOCAL_SPACE_MINUTES: &str = "%Y-%m-%d %H:%M";
const DATE_ONLY: &str = "%Y-%m-%d";

/// Offset date-time formats accepted besides strict RFC 3339
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"];

/// Current local timestamp, the fallback for undated posts
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Converts an instant into the local naive timestamp
pub fn to_local(instant: DateTime<Utc>) -> NaiveDateTime {
    instant.with_timezone(&Local).naive_local()
}

/// Parses heterogeneous date/time text into a local timestamp
///
/// # Parse Order
///
/// The first format that succeeds wins:
///
/// 1. UTC instant (`2025-01-01T09:30:00Z`)
/// 2. Offset date-time (`2025-02-10T08:45:00+09:00`)
/// 3. Zoned date-time (`2025-02-10T08:45:00+09:00[Asia/Seoul]`)
/// 4. ISO local date-time (`2025-02-10T08:45:00`)
/// 5. Space separated local date-time with seconds (`2025-02-10 08:45:00`)
/// 6. Space separated local date-time with minutes (`2025-02-10 08:45`)
/// 7. Date only, at midnight (`2025-02-10`)
///
/// Instants and offset values are converted into the local zone; local values
/// are taken as-is.
///
/// # Returns
///
/// * `Some(NaiveDateTime)` - The reconciled timestamp
/// * `None` - The value is blank or matches none of the formats
pub fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    parse_utc_instant(value)
        .or_else(|| parse_offset(value))
        .or_else(|| parse_zoned(value))
        .or_else(|| {
            LOCAL_ISO_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        })
        .or_else(|| NaiveDateTime::parse_from_str(value, LOCAL_SPACE_SECONDS).ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, LOCAL_SPACE_MINUTES).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_ONLY)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn parse_utc_instant(value: &str) -> Option<NaiveDateTime> {
    if !value.ends_with(['Z', 'z']) {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|instant| to_local(instant.with_timezone(&Utc)))
}

fn parse_offset(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|format| DateTime::parse_from_str(value, format).ok())
        })
        .map(|instant| to_local(instant.with_timezone(&Utc)))
}

/// Zoned values carry an offset followed by a bracketed region id.
/// The offset alone fixes the instant, so the region is dropped.
fn parse_zoned(value: &str) -> Option<NaiveDateTime> {
    let (offset_part, region) = value.split_once('[')?;
    if !region.ends_with(']') {
        return None;
    }
    parse_utc_instant(offset_part).or_else(|| parse_offset(offset_part))
}
