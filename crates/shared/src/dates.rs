//! Calendar date helpers.
//!
//! Expiry fields are plain calendar dates. Day arithmetic never touches
//! wall-clock time, so "today" is resolved once at the edge using the
//! configured UTC offset and passed down as a `NaiveDate`.

use chrono::{Duration, FixedOffset, NaiveDate, Utc};
use thiserror::Error;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// Serial of 9999-12-31, the last date Excel can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateParseError {
    #[error("صيغة التاريخ غير مدعومة: {0}")]
    UnsupportedFormat(String),

    #[error("التاريخ خارج النطاق المسموح: {0}")]
    OutOfRange(String),
}

/// Today's calendar date at a fixed UTC offset (hours). Offsets outside
/// +-23 fall back to UTC.
pub fn today_at_offset(offset_hours: i32) -> NaiveDate {
    let now = Utc::now();
    match FixedOffset::east_opt(offset_hours * 3600) {
        Some(offset) => now.with_timezone(&offset).date_naive(),
        None => now.date_naive(),
    }
}

/// Converts an Excel serial day number into a date (1900 date system).
///
/// Serial 60 is Excel's phantom 1900-02-29, so the epoch is anchored at
/// 1899-12-30 which is exact for every serial after it. The result obeys
/// the same year bounds as [`parse_flexible_date`].
pub fn excel_serial_to_date(serial: f64) -> Result<NaiveDate, DateParseError> {
    if !serial.is_finite() || serial < 1.0 {
        return Err(DateParseError::UnsupportedFormat(serial.to_string()));
    }
    if serial > MAX_EXCEL_SERIAL {
        return Err(DateParseError::OutOfRange(serial.to_string()));
    }
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)
        .zip(Duration::try_days(serial.trunc() as i64))
        .and_then(|(epoch, days)| epoch.checked_add_signed(days))
        .ok_or_else(|| DateParseError::OutOfRange(serial.to_string()))?;
    check_range(date, &serial.to_string())
}

/// Parses the date spellings found in spreadsheets and form input.
///
/// Accepted, in order: `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`, `DD/MM/YYYY`,
/// `DD-MM-YYYY`, `MM/DD/YYYY` (only when the day/month reading is invalid),
/// `DD-Mon-YYYY`, `YYYY-Mon-DD`, and an RFC 3339 timestamp prefix.
pub fn parse_flexible_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DateParseError::UnsupportedFormat(input.to_string()));
    }

    // timestamps exported by other tools: keep the date part only
    let candidate = match trimmed.find('T') {
        Some(idx) if idx == 10 => &trimmed[..idx],
        _ => trimmed,
    };

    const FORMATS: &[&str] = &[
        "%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%d/%m/%Y", "%d-%m-%Y", "%m/%d/%Y", "%m-%d-%Y",
        "%d-%b-%Y", "%d/%b/%Y", "%d-%B-%Y", "%d %B %Y", "%Y-%b-%d", "%Y/%b/%d",
    ];

    let parsed = FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(candidate, fmt).ok())
        .ok_or_else(|| DateParseError::UnsupportedFormat(input.to_string()))?;

    check_range(parsed, input)
}

fn check_range(date: NaiveDate, input: &str) -> Result<NaiveDate, DateParseError> {
    use chrono::Datelike;
    if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        Ok(date)
    } else {
        Err(DateParseError::OutOfRange(input.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_iso_variants() {
        assert_eq!(parse_flexible_date("2024-06-01").unwrap(), d(2024, 6, 1));
        assert_eq!(parse_flexible_date("2024/6/1").unwrap(), d(2024, 6, 1));
        assert_eq!(parse_flexible_date("20240601").unwrap(), d(2024, 6, 1));
        assert_eq!(
            parse_flexible_date("2024-06-01T00:00:00Z").unwrap(),
            d(2024, 6, 1)
        );
    }

    #[test]
    fn test_day_first_preferred() {
        assert_eq!(parse_flexible_date("05/11/1995").unwrap(), d(1995, 11, 5));
        assert_eq!(parse_flexible_date("05-11-1995").unwrap(), d(1995, 11, 5));
    }

    #[test]
    fn test_month_first_fallback() {
        assert_eq!(parse_flexible_date("12/25/2024").unwrap(), d(2024, 12, 25));
    }

    #[test]
    fn test_month_names() {
        assert_eq!(parse_flexible_date("03-May-2026").unwrap(), d(2026, 5, 3));
        assert_eq!(parse_flexible_date("04/Jun/1997").unwrap(), d(1997, 6, 4));
        assert_eq!(parse_flexible_date("1995-Nov-05").unwrap(), d(1995, 11, 5));
    }

    #[test]
    fn test_rejects_garbage_and_out_of_range() {
        assert!(matches!(
            parse_flexible_date("غير معروف"),
            Err(DateParseError::UnsupportedFormat(_))
        ));
        assert!(parse_flexible_date("").is_err());
        assert!(parse_flexible_date("2024-02-30").is_err());
        assert!(matches!(
            parse_flexible_date("1850-01-01"),
            Err(DateParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(excel_serial_to_date(45444.0), Ok(d(2024, 6, 1)));
        assert_eq!(excel_serial_to_date(61.0), Ok(d(1900, 3, 1)));
        assert_eq!(excel_serial_to_date(45444.75), Ok(d(2024, 6, 1)));
        assert!(excel_serial_to_date(0.0).is_err());
        assert!(excel_serial_to_date(f64::NAN).is_err());
    }

    #[test]
    fn test_excel_serial_huge_values_are_errors() {
        assert!(matches!(
            excel_serial_to_date(2.0e14),
            Err(DateParseError::OutOfRange(_))
        ));
        assert!(matches!(
            excel_serial_to_date(f64::MAX),
            Err(DateParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_excel_serial_uses_same_year_bounds_as_text() {
        // 1e6 lands in the year 4637
        assert!(matches!(
            excel_serial_to_date(1.0e6),
            Err(DateParseError::OutOfRange(_))
        ));
        assert!(parse_flexible_date("4637-11-25").is_err());
        // 2100-12-31 is the last accepted day
        assert_eq!(excel_serial_to_date(73415.0), Ok(d(2100, 12, 31)));
        assert!(excel_serial_to_date(73416.0).is_err());
    }

    #[test]
    fn test_today_at_offset_is_close_to_utc() {
        let utc = Utc::now().date_naive();
        let riyadh = today_at_offset(3);
        assert!((riyadh - utc).num_days().abs() <= 1);
        assert_eq!(today_at_offset(99), Utc::now().date_naive());
    }
}
