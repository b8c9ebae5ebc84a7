//! Formatting helpers shared by front ends.

use chrono::{DateTime, Duration, Utc};

/// Format a timestamp relative to `now` (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Format a number of seconds compactly ("45s", "25m 30s", "1h 05m").
pub fn format_duration_secs(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Format remaining cooldown ("3h 12m left"), or "ready" when elapsed.
pub fn format_cooldown(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        return "ready".to_string();
    }
    format!("{} left", format_duration_secs(remaining.num_seconds().max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_duration_secs() {
        assert_eq!(format_duration_secs(0), "0s");
        assert_eq!(format_duration_secs(45), "45s");
        assert_eq!(format_duration_secs(1530), "25m 30s");
        assert_eq!(format_duration_secs(3900), "1h 05m");
        assert_eq!(format_duration_secs(-10), "0s");
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time(now - Duration::seconds(30), now), "30s ago");
        assert_eq!(format_relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative_time(now + Duration::minutes(1), now), "just now");
        assert_eq!(format_relative_time(now - Duration::days(30), now), "Feb 08");
    }

    #[test]
    fn test_format_cooldown() {
        assert_eq!(format_cooldown(Duration::zero()), "ready");
        assert_eq!(format_cooldown(Duration::hours(-1)), "ready");
        assert_eq!(format_cooldown(Duration::minutes(90)), "1h 30m left");
    }
}
