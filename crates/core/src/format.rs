//! Display formatting helpers

use chrono::{DateTime, Utc};

/// Relative age of `timestamp` as seen from `now`
///
/// Produces `"42s ago"`, `"5mins ago"`, `"1hr ago"`; anything older than a
/// day is shown as an absolute date. `ignore_ago` drops the suffix, which is
/// used for "in the past 4hrs" style labels.
pub fn format_time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>, ignore_ago: bool) -> String {
    let seconds = (now - timestamp).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;

    if hours >= 24 {
        return timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
    }

    let amount = if hours > 0 {
        format!("{}hr{}", hours, plural(hours))
    } else if minutes > 0 {
        format!("{}min{}", minutes, plural(minutes))
    } else {
        format!("{}s", seconds)
    };

    if ignore_ago {
        amount
    } else {
        format!("{} ago", amount)
    }
}

fn plural(n: i64) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// Two-decimal rendering with thousands separators, e.g. `1,234,567.89`
pub fn format_number_with_commas(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}{}.{}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_time_ago_units() {
        let now = Utc::now();
        assert_eq!(format_time_ago(now - Duration::seconds(42), now, false), "42s ago");
        assert_eq!(format_time_ago(now - Duration::minutes(1), now, false), "1min ago");
        assert_eq!(format_time_ago(now - Duration::minutes(5), now, false), "5mins ago");
        assert_eq!(format_time_ago(now - Duration::hours(4), now, true), "4hrs");
    }

    #[test]
    fn test_time_ago_absolute_after_a_day() {
        let now = Utc::now();
        let old = now - Duration::hours(30);
        assert_eq!(
            format_time_ago(old, now, false),
            old.format("%Y-%m-%d %H:%M:%S").to_string()
        );
    }

    #[test]
    fn test_time_ago_future_clamps() {
        let now = Utc::now();
        assert_eq!(format_time_ago(now + Duration::seconds(10), now, false), "0s ago");
    }

    #[test]
    fn test_number_with_commas() {
        assert_eq!(format_number_with_commas(0.0), "0.00");
        assert_eq!(format_number_with_commas(999.999), "1,000.00");
        assert_eq!(format_number_with_commas(1234567.891), "1,234,567.89");
        assert_eq!(format_number_with_commas(-2500.5), "-2,500.50");
    }
}
