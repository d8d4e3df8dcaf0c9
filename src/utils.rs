use crate::models::Step;
use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};

/// Day precision used by the persisted range record.
pub const DAY_FORMAT: &str = "%Y/%m/%d";
/// Minute precision accepted from the range picker.
pub const PICKER_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Interpret a wall-clock reading in the local zone. Skipped DST hours fall
/// back to reading the value as UTC.
pub fn local_instant(naive: NaiveDateTime) -> DateTime<Local> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

pub fn format_day(at: DateTime<Local>) -> String {
    at.format(DAY_FORMAT).to_string()
}

/// Parse `YYYY/MM/DD` into local midnight.
pub fn parse_day(raw: &str) -> Option<DateTime<Local>> {
    let date = NaiveDate::parse_from_str(raw.trim(), DAY_FORMAT).ok()?;
    date.and_hms_opt(0, 0, 0).map(local_instant)
}

/// Local midnight of the day after `at`.
pub fn next_midnight(at: DateTime<Local>) -> Option<DateTime<Local>> {
    let next = at.date_naive().succ_opt()?;
    next.and_hms_opt(0, 0, 0).map(local_instant)
}

/// Parse a range-picker endpoint: `YYYY-MM-DD HH:MM`, `YYYY-MM-DD` or `YYYY/MM/DD`.
pub fn parse_picker_instant(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, PICKER_FORMAT) {
        return Some(local_instant(naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(local_instant);
    }
    parse_day(raw)
}

/// Parse a refresh step: bare milliseconds (`5000`) or a humantime span (`5s`).
pub fn parse_step(raw: &str) -> Result<Step> {
    if let Some(step) = Step::parse(raw) {
        return Ok(step);
    }
    let span = humantime::parse_duration(raw.trim())
        .map_err(|e| anyhow::anyhow!("Invalid step '{}': {}", raw, e))?;
    u64::try_from(span.as_millis())
        .ok()
        .filter(|ms| *ms <= Step::MAX_MILLIS)
        .map(Step::from_millis)
        .ok_or_else(|| anyhow::anyhow!("Step '{}' is too large", raw))
}

pub fn format_span(span: TimeDelta) -> String {
    let seconds = span.num_seconds().max(0);
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if mins > 0 {
        parts.push(format!("{}m", mins));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{}s", secs));
    }

    parts.join(" ")
}

pub fn format_step(step: Option<Step>) -> String {
    match step {
        Some(s) if !s.is_off() => i64::try_from(s.millis())
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .map(format_span)
            .unwrap_or_else(|| format!("{}ms", s.millis())),
        _ => "off".to_string(),
    }
}
