//! Formatting helpers shared across front ends.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::types::NO_GRADE;

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// A derived grade, or `N/A` when there is none.
pub fn format_grade_opt(grade: Option<&str>) -> &str {
    grade.unwrap_or(NO_GRADE)
}

/// Session timer display, `HH:MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Session date as shown in history lists (e.g., "Jun 1, 2025").
pub fn format_session_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => "unknown date".to_string(),
    }
}
