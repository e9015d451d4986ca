use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a backend timestamp into milliseconds since the Unix epoch.
///
/// Accepts RFC 3339, zone-less date-times (read as UTC), bare dates
/// (midnight UTC) and integer epochs. Returns `None` for blank or
/// unrecognized input.
pub fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return parse_epoch_ms(trimmed);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.timestamp_millis());
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Bare integers are Unix seconds up to ten digits, milliseconds beyond.
fn parse_epoch_ms(digits: &str) -> Option<i64> {
    let value: i64 = digits.parse().ok()?;
    if digits.len() <= 10 {
        value.checked_mul(1_000)
    } else {
        Some(value)
    }
}

/// Ordering key for records carrying `updated_at`/`created_at`.
///
/// `updated_at` wins when it parses, then `created_at`, then epoch 0.
pub fn record_timestamp_ms(updated_at: Option<&str>, created_at: Option<&str>) -> i64 {
    updated_at
        .and_then(parse_timestamp_ms)
        .or_else(|| created_at.and_then(parse_timestamp_ms))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_naive_and_date_only() {
        assert_eq!(parse_timestamp_ms("1970-01-01T00:00:01Z"), Some(1_000));
        assert_eq!(parse_timestamp_ms("1970-01-01T01:00:00+01:00"), Some(0));
        assert_eq!(parse_timestamp_ms("1970-01-01T00:00:02.500"), Some(2_500));
        assert_eq!(parse_timestamp_ms("1970-01-01 00:00:03"), Some(3_000));
        assert_eq!(parse_timestamp_ms("1970-01-02"), Some(86_400_000));
    }

    #[test]
    fn parses_epoch_seconds_and_millis() {
        assert_eq!(parse_timestamp_ms("1704153600"), Some(1_704_153_600_000));
        assert_eq!(parse_timestamp_ms("1704153600123"), Some(1_704_153_600_123));
        assert_eq!(parse_timestamp_ms("99999999999999999999"), None);
    }

    #[test]
    fn rejects_blank_and_garbage() {
        assert_eq!(parse_timestamp_ms(""), None);
        assert_eq!(parse_timestamp_ms("   "), None);
        assert_eq!(parse_timestamp_ms("yesterday"), None);
    }

    #[test]
    fn record_timestamp_falls_back_to_created_then_epoch() {
        assert_eq!(
            record_timestamp_ms(Some("1970-01-02"), Some("1970-01-03")),
            86_400_000
        );
        assert_eq!(
            record_timestamp_ms(Some("not a date"), Some("1970-01-03")),
            2 * 86_400_000
        );
        assert_eq!(record_timestamp_ms(None, None), 0);
        assert_eq!(record_timestamp_ms(Some("bad"), Some("worse")), 0);
    }
}
