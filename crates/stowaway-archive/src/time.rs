//! Conversions between chrono timestamps and zip's DOS timestamps

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

/// Nearest representable DOS timestamp (1980..=2107, 2-second resolution);
/// out-of-range times fall back to the zip epoch.
pub(crate) fn to_zip(time: DateTime<Utc>) -> zip::DateTime {
    let year = u16::try_from(time.year()).unwrap_or(0);
    zip::DateTime::from_date_and_time(
        year,
        time.month() as u8,
        time.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
    )
    .unwrap_or_default()
}

pub(crate) fn from_zip(time: zip::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(time.year() as i32, time.month() as u32, time.day() as u32)?
        .and_hms_opt(time.hour() as u32, time.minute() as u32, time.second() as u32)
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_round_trip_even_seconds() {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 42).unwrap();
        assert_eq!(from_zip(to_zip(time)), Some(time));
    }

    #[test]
    fn test_out_of_range_falls_back() {
        let time = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_zip(time), zip::DateTime::default());
    }
}
