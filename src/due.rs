//! Due date parsing and formatting.
//!
//! Input is validated here, at the boundary, so the store only ever sees
//! absolute instants. Wall-clock input is read in the local timezone and
//! normalised to UTC.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::StoreError;

const WALL_CLOCK_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse human-readable due date input.
///
/// Supports:
/// - empty input (no due date)
/// - RFC 3339 instants, e.g. `2025-01-01T10:00:00.000Z`
/// - `YYYY-MM-DDTHH:MM` and `YYYY-MM-DD HH:MM` in local time
/// - `YYYY-MM-DD`, `today`, `tomorrow` (end of that local day)
/// - `in 30m`, `in 2h`, `in 3d`, `in 1w` relative to `now`
pub fn parse_due_input(s: &str, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, StoreError> {
    let raw = s.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let invalid = || StoreError::InvalidDueDate(raw.to_string());
    let lower = raw.to_lowercase();
    let today = now.with_timezone(&Local).date_naive();

    match lower.as_str() {
        "today" => return end_of_local_day(today).map(Some).ok_or_else(invalid),
        "tomorrow" => {
            return end_of_local_day(today + Duration::days(1))
                .map(Some)
                .ok_or_else(invalid)
        }
        _ => {}
    }

    if let Some(rest) = lower.strip_prefix("in ") {
        return relative_offset(rest.trim())
            .and_then(|offset| now.checked_add_signed(offset))
            .map(Some)
            .ok_or_else(invalid);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    for fmt in WALL_CLOCK_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return local_to_utc(naive).map(Some).ok_or_else(invalid);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return end_of_local_day(date).map(Some).ok_or_else(invalid);
    }

    Err(invalid())
}

fn relative_offset(rest: &str) -> Option<Duration> {
    let unit = rest.chars().last()?;
    let amount: i64 = rest[..rest.len() - unit.len_utf8()].trim().parse().ok()?;
    if amount < 0 {
        return None;
    }
    match unit {
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        'w' => Duration::try_weeks(amount),
        _ => None,
    }
}

fn end_of_local_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(23, 59, 0)?;
    local_to_utc(date.and_time(time))
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a due date as a short local date and time (`dd/mm/yyyy, HH:MM`).
pub fn format_due(due: Option<DateTime<Utc>>) -> String {
    match due {
        None => String::new(),
        Some(d) => d.with_timezone(&Local).format("%d/%m/%Y, %H:%M").to_string(),
    }
}

/// Format a due date as editable form input (`YYYY-MM-DDTHH:MM`, local).
pub fn format_due_input(due: Option<DateTime<Utc>>) -> String {
    match due {
        None => String::new(),
        Some(d) => d.with_timezone(&Local).format("%Y-%m-%dT%H:%M").to_string(),
    }
}

/// Format a due date relative to now ("in 3h", "2d late").
pub fn format_due_relative(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(d) = due else {
        return "-".into();
    };
    let delta = d - now;
    let span = if delta < Duration::zero() { -delta } else { delta };
    let amount = if span.num_days() > 0 {
        format!("{}d", span.num_days())
    } else if span.num_hours() > 0 {
        format!("{}h", span.num_hours())
    } else if span.num_minutes() > 0 {
        format!("{}m", span.num_minutes())
    } else {
        return "now".into();
    };
    if delta < Duration::zero() {
        format!("{amount} late")
    } else {
        format!("in {amount}")
    }
}
