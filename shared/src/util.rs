//! Time and display helpers

use chrono::{Local, TimeZone};

/// Current UTC timestamp (milliseconds)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Format cents as dollars with thousands separators: `123456` → `"1,234.56"`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = (abs / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}{grouped}.{:02}", abs % 100)
}

/// Format a Unix-millis timestamp in local time as `"Jan 05, 14:03:09"`
///
/// Non-positive timestamps (including the `-1` missing marker) render as
/// `"Unknown time"`.
pub fn format_timestamp(millis: i64) -> String {
    if millis <= 0 {
        return "Unknown time".to_string();
    }
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%b %d, %H:%M:%S").to_string(),
        None => "Unknown time".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(1250), "12.50");
        assert_eq!(format_cents(123_456), "1,234.56");
        assert_eq!(format_cents(100_000_000), "1,000,000.00");
        assert_eq!(format_cents(-1700), "-17.00");
        assert_eq!(format_cents(-50), "-0.50");
    }

    #[test]
    fn test_format_timestamp_unknown() {
        assert_eq!(format_timestamp(-1), "Unknown time");
        assert_eq!(format_timestamp(0), "Unknown time");
    }

    #[test]
    fn test_format_timestamp_shape() {
        let formatted = format_timestamp(1_700_000_000_000);
        // "Nov 14, 22:13:20" in UTC; exact text depends on the local zone
        assert_eq!(formatted.len(), "Nov 14, 22:13:20".len());
        assert_eq!(&formatted[6..8], ", ");
    }
}
