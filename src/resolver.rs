use crate::catalog::{self, Shortcut};
use crate::models::{
    Duration, FieldValue, FormFields, FormSubmission, PersistedRange, Step, Window, RANGE_FIELD,
    STEP_FIELD,
};
use crate::utils::{format_day, next_midnight, parse_day};
use chrono::{DateTime, Local};
use tracing::{debug, warn};

/// The two persisted values exactly as read from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSelection {
    pub label: Option<String>,
    pub range: Option<String>,
}

/// Restore the selection from persisted state.
///
/// The label is resolved first. A valid explicit range record is applied
/// afterwards and wins. Anything unreadable falls back to the default shortcut.
pub fn resolve_selection(raw: &RawSelection) -> Duration {
    let mut selected = resolve_label(raw.label.as_deref()).duration();

    if let Some(record) = raw.range.as_deref().and_then(decode_range) {
        match restore_range(&record) {
            Some(duration) => selected = duration,
            None => warn!(
                begin = %record.begin_time,
                end = %record.end_time,
                "ignoring persisted range with unreadable or inverted dates"
            ),
        }
    }

    selected
}

fn resolve_label(label: Option<&str>) -> &'static Shortcut {
    let Some(label) = label else {
        return catalog::default_shortcut();
    };
    match catalog::find_by_label(label) {
        Some(entry) => entry,
        None => {
            debug!(label, "unknown persisted label, using default shortcut");
            catalog::default_shortcut()
        }
    }
}

/// Decode a `timesstep` value. `null` means cleared; malformed JSON is ignored.
pub fn decode_range(raw: &str) -> Option<PersistedRange> {
    match serde_json::from_str::<Option<PersistedRange>>(raw) {
        Ok(record) => record,
        Err(err) => {
            warn!(%err, "ignoring malformed persisted range");
            None
        }
    }
}

/// A record whose begin and end fall on the same day covers that whole day.
/// Inverted records are rejected.
fn restore_range(record: &PersistedRange) -> Option<Duration> {
    let start = parse_day(&record.begin_time)?;
    let mut end = parse_day(&record.end_time)?;
    if end == start {
        end = next_midnight(start)?;
    }
    if end < start {
        return None;
    }
    Some(Duration::explicit(start, end, Step::parse(&record.step)))
}

/// Apply a validated form. The caller guarantees the range is present and
/// well-formed.
pub fn resolve_form_submission(current: &Duration, fields: &FormFields) -> FormSubmission {
    let mut window = None;
    let mut step = None;
    let mut persisted = PersistedRange::default();

    for (name, value) in fields {
        match value {
            FieldValue::Range(start, end) if name == RANGE_FIELD => {
                persisted.begin_time = format_day(*start);
                persisted.end_time = format_day(*end);
                window = Some(Window::Absolute {
                    start: *start,
                    end: *end,
                });
            }
            FieldValue::Scalar(value) if !value.is_empty() && name == STEP_FIELD => {
                persisted.step = value.clone();
                step = Step::parse(value);
                if step.is_none() {
                    debug!(value = %value, "step is not a millisecond count, dropping it");
                }
            }
            FieldValue::Empty => {}
            FieldValue::Scalar(value) if value.is_empty() => {}
            _ => debug!(field = %name, "ignoring form field"),
        }
    }

    let step = step.or(current.step);
    let duration = match window {
        Some(window) => Duration {
            window,
            step,
            label: None,
        },
        None => Duration {
            step,
            ..current.clone()
        },
    };

    FormSubmission {
        duration,
        persisted,
    }
}

/// Select a catalog entry directly, keeping the current refresh step.
pub fn resolve_shortcut_click(current: &Duration, entry: &'static Shortcut) -> Duration {
    Duration {
        step: current.step,
        ..entry.duration()
    }
}

/// Range endpoints may never lie in the future.
pub fn disabled_date(candidate: DateTime<Local>, now: DateTime<Local>) -> bool {
    candidate >= now
}
