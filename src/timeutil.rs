//! Time parsing and range helpers
//!
//! The core speaks epoch milliseconds everywhere. The upstream API is
//! allowed to send timestamps as epoch numbers (seconds or milliseconds)
//! or as ISO-8601 strings; everything funnels through the coercion
//! helpers here.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Epoch values at or above this are already milliseconds, below are seconds.
/// 100_000_000_000 as seconds would be the year 5138; as milliseconds it is 1973.
const EPOCH_MS_CUTOFF: f64 = 100_000_000_000.0;

/// Coerce a raw epoch number into epoch milliseconds
pub fn coerce_epoch_ms(num: f64) -> Option<i64> {
    if !num.is_finite() || num <= 0.0 {
        return None;
    }
    if num < EPOCH_MS_CUTOFF {
        Some((num * 1000.0).round() as i64)
    } else {
        Some(num.round() as i64)
    }
}

/// Parse a timestamp string into epoch milliseconds.
///
/// Accepts stringified epoch numbers, RFC 3339, and the common ISO-8601
/// variants without offset (interpreted as UTC).
pub fn parse_timestamp_str(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(num) = trimmed.parse::<f64>() {
        return coerce_epoch_ms(num);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for format in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    // Bare dates (summary endpoints report "busiest day" this way)
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }

    None
}

/// Order an arbitrary gesture pair so start <= end
pub fn normalize_range(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Bin resolution for a span.
///
/// The thresholds are an external contract with the server's aggregation
/// granularity and must match it exactly for bin alignment.
pub fn bin_interval_for(span_sec: i64) -> i64 {
    const HOUR: i64 = 3600;
    const DAY: i64 = 24 * HOUR;

    if span_sec <= 6 * HOUR {
        60
    } else if span_sec <= 3 * DAY {
        5 * 60
    } else if span_sec <= 14 * DAY {
        15 * 60
    } else if span_sec <= 60 * DAY {
        HOUR
    } else {
        4 * HOUR
    }
}

/// Human-readable span, e.g. "2d 4h" or "90s"
pub fn format_span_sec(span_sec: i64) -> String {
    let days = span_sec / 86_400;
    let hours = (span_sec % 86_400) / 3600;
    let minutes = (span_sec % 3600) / 60;
    if days > 0 {
        if hours > 0 {
            format!("{}d {}h", days, hours)
        } else {
            format!("{}d", days)
        }
    } else if hours > 0 {
        if minutes > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}h", hours)
        }
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", span_sec)
    }
}

/// Format epoch milliseconds for axis labels and cards
pub fn format_timestamp_ms(ms: i64, format: &str) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_range_orders_pair() {
        assert_eq!(normalize_range(5000.0, 1000.0), (1000.0, 5000.0));
        assert_eq!(normalize_range(1000.0, 5000.0), (1000.0, 5000.0));
    }

    #[test]
    fn test_epoch_coercion_disambiguates_units() {
        // Seconds get scaled up
        assert_eq!(coerce_epoch_ms(1_700_000_000.0), Some(1_700_000_000_000));
        // Milliseconds pass through
        assert_eq!(coerce_epoch_ms(1_700_000_000_000.0), Some(1_700_000_000_000));
        assert_eq!(coerce_epoch_ms(f64::NAN), None);
        assert_eq!(coerce_epoch_ms(-5.0), None);
    }

    #[test]
    fn test_parse_timestamp_str_variants() {
        assert_eq!(
            parse_timestamp_str("2024-01-15T14:30:00Z"),
            Some(1_705_329_000_000)
        );
        assert_eq!(
            parse_timestamp_str("2024-01-15 14:30:00"),
            Some(1_705_329_000_000)
        );
        assert_eq!(
            parse_timestamp_str("1705329000"),
            Some(1_705_329_000_000)
        );
        assert_eq!(parse_timestamp_str("not a time"), None);
        assert_eq!(parse_timestamp_str(""), None);
    }

    #[test]
    fn test_bin_interval_thresholds() {
        const HOUR: i64 = 3600;
        const DAY: i64 = 24 * HOUR;
        assert_eq!(bin_interval_for(HOUR), 60);
        assert_eq!(bin_interval_for(6 * HOUR), 60);
        assert_eq!(bin_interval_for(6 * HOUR + 1), 300);
        assert_eq!(bin_interval_for(3 * DAY), 300);
        assert_eq!(bin_interval_for(7 * DAY), 900);
        assert_eq!(bin_interval_for(30 * DAY), 3600);
        assert_eq!(bin_interval_for(90 * DAY), 14_400);
    }

    #[test]
    fn test_format_span() {
        assert_eq!(format_span_sec(90), "1m");
        assert_eq!(format_span_sec(45), "45s");
        assert_eq!(format_span_sec(7 * 3600 + 1800), "7h 30m");
        assert_eq!(format_span_sec(2 * 86_400 + 4 * 3600), "2d 4h");
    }
}
