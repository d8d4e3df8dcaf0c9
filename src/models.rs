use chrono::{DateTime, Local, Months, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Form field carrying the picked `[start, end]` pair.
pub const RANGE_FIELD: &str = "range-time-picker";
/// Form field carrying the refresh step in milliseconds.
pub const STEP_FIELD: &str = "step";

/// How far back a relative window reaches from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    Minutes(i64),
    Hours(i64),
    Days(i64),
    Months(u32),
}

impl Offset {
    /// The instant `self` before `now`. Months are calendar months, clamped to
    /// the end of shorter months.
    pub fn before(&self, now: DateTime<Local>) -> DateTime<Local> {
        match *self {
            Offset::Minutes(m) => now - TimeDelta::minutes(m),
            Offset::Hours(h) => now - TimeDelta::hours(h),
            Offset::Days(d) => now - TimeDelta::days(d),
            Offset::Months(m) => now
                .checked_sub_months(Months::new(m))
                .unwrap_or_else(|| now - TimeDelta::days(30 * i64::from(m))),
        }
    }
}

/// The time span a [`Duration`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// A fixed pair of instants picked by the user.
    Absolute {
        start: DateTime<Local>,
        end: DateTime<Local>,
    },
    /// `[now - offset, now]`, re-evaluated every time it is materialized.
    Relative { offset: Offset },
}

impl Window {
    pub fn materialize(&self, now: DateTime<Local>) -> (DateTime<Local>, DateTime<Local>) {
        match *self {
            Window::Absolute { start, end } => (start, end),
            Window::Relative { offset } => (offset.before(now), now),
        }
    }
}

/// Auto-refresh interval in milliseconds. Zero disables polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Step(u64);

impl Step {
    pub const OFF: Step = Step(0);
    /// The intervals offered by the panel's reload selector.
    pub const CHOICES: [Step; 4] = [Step(0), Step(5_000), Step(10_000), Step(30_000)];
    /// Largest step that still fits a signed millisecond span.
    pub const MAX_MILLIS: u64 = i64::MAX as u64;

    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn millis(&self) -> u64 {
        self.0
    }

    pub fn is_off(&self) -> bool {
        *self == Self::OFF
    }

    /// How often a poller should re-issue its query, if at all.
    pub fn refresh_interval(&self) -> Option<std::time::Duration> {
        if self.is_off() {
            None
        } else {
            Some(std::time::Duration::from_millis(self.0))
        }
    }

    /// Parse the persisted millisecond string (`"0"`, `"5000"`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms <= Self::MAX_MILLIS)
            .map(Self)
    }

    /// The next entry of [`Step::CHOICES`], wrapping around.
    pub fn next_choice(&self) -> Self {
        let pos = Self::CHOICES.iter().position(|s| s == self);
        match pos {
            Some(i) => Self::CHOICES[(i + 1) % Self::CHOICES.len()],
            None => Self::CHOICES[0],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The currently selected time window, as handed to data queries.
///
/// `label` is set only when the window came from a catalog shortcut; a custom
/// range always carries `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duration {
    pub window: Window,
    pub step: Option<Step>,
    pub label: Option<&'static str>,
}

impl Duration {
    pub fn explicit(start: DateTime<Local>, end: DateTime<Local>, step: Option<Step>) -> Self {
        Self {
            window: Window::Absolute { start, end },
            step,
            label: None,
        }
    }

    pub fn from(&self, now: DateTime<Local>) -> DateTime<Local> {
        self.materialize(now).0
    }

    pub fn to(&self, now: DateTime<Local>) -> DateTime<Local> {
        self.materialize(now).1
    }

    pub fn materialize(&self, now: DateTime<Local>) -> (DateTime<Local>, DateTime<Local>) {
        self.window.materialize(now)
    }

    pub fn is_custom(&self) -> bool {
        self.label.is_none()
    }
}

/// The `timesstep` record written for explicit-range selections.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRange {
    #[serde(default)]
    pub begin_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub step: String,
}

/// A single value captured by the form layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Range(DateTime<Local>, DateTime<Local>),
    Scalar(String),
    Empty,
}

pub type FormFields = BTreeMap<String, FieldValue>;

/// Output of a form confirmation: the new selection and the record to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub duration: Duration,
    pub persisted: PersistedRange,
}
