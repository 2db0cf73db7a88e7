//! Time handling
//!
//! The source system stamps dated folders and audit rows at a fixed offset
//! from the execution clock (UTC+3 by default). That offset is a preserved
//! decision, not a local-timezone lookup.

use chrono::{DateTime, FixedOffset, Utc};

/// Fixed offset for the configured hour shift. Out-of-range values fall back
/// to UTC.
pub fn fixed_offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours.saturating_mul(3600))
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
}

/// Dated subfolder name, `DD-MM-YYYY` at the given offset.
pub fn dated_folder_name(now: DateTime<Utc>, offset_hours: i32) -> String {
    now.with_timezone(&fixed_offset(offset_hours))
        .format("%d-%m-%Y")
        .to_string()
}

/// Audit row timestamp, `YYYY-MM-DD HH:MM:SS` at the given offset.
pub fn audit_timestamp(now: DateTime<Utc>, offset_hours: i32) -> String {
    now.with_timezone(&fixed_offset(offset_hours))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dated_name_uses_day_month_year() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(dated_folder_name(now, 3), "07-03-2024");
    }

    #[test]
    fn offset_rolls_the_date_past_midnight() {
        // 22:30 UTC is 01:30 next day at +3.
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 22, 30, 0).unwrap();
        assert_eq!(dated_folder_name(now, 3), "08-03-2024");
        assert_eq!(dated_folder_name(now, 0), "07-03-2024");
    }

    #[test]
    fn audit_timestamp_is_shifted_too() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 22, 30, 15).unwrap();
        assert_eq!(audit_timestamp(now, 3), "2024-03-08 01:30:15");
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 22, 30, 0).unwrap();
        assert_eq!(dated_folder_name(now, 9999), "07-03-2024");
    }
}
