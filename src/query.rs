use crate::models::Duration;
use chrono::{DateTime, Datelike, Local, Months, TimeDelta};
use serde::Serialize;

/// Bucket granularity the backend aggregates by.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum BucketUnit {
    Month,
    Day,
    Hour,
    Minute,
}

impl BucketUnit {
    /// Coarsest unit of which the window spans more than one whole step.
    pub fn measure(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        if months_between(start, end) > 1 {
            BucketUnit::Month
        } else if (end - start).num_days() > 1 {
            BucketUnit::Day
        } else if (end - start).num_hours() > 1 {
            BucketUnit::Hour
        } else {
            BucketUnit::Minute
        }
    }

    fn input_format(&self) -> &'static str {
        match self {
            BucketUnit::Month => "%Y-%m",
            BucketUnit::Day => "%Y-%m-%d",
            BucketUnit::Hour => "%Y-%m-%d %H",
            BucketUnit::Minute => "%Y-%m-%d %H%M",
        }
    }

    fn display_format(&self) -> &'static str {
        match self {
            BucketUnit::Month => "%Y-%m",
            BucketUnit::Day => "%m-%d",
            BucketUnit::Hour => "%m-%d %H",
            BucketUnit::Minute => "%H:%M",
        }
    }

    fn between(&self, start: DateTime<Local>, end: DateTime<Local>) -> i64 {
        match self {
            BucketUnit::Month => i64::from(months_between(start, end)),
            BucketUnit::Day => (end - start).num_days(),
            BucketUnit::Hour => (end - start).num_hours(),
            BucketUnit::Minute => (end - start).num_minutes(),
        }
    }

    fn advance(&self, from: DateTime<Local>, n: u32) -> Option<DateTime<Local>> {
        match self {
            BucketUnit::Month => from.checked_add_months(Months::new(n)),
            BucketUnit::Day => from.checked_add_signed(TimeDelta::days(i64::from(n))),
            BucketUnit::Hour => from.checked_add_signed(TimeDelta::hours(i64::from(n))),
            BucketUnit::Minute => from.checked_add_signed(TimeDelta::minutes(i64::from(n))),
        }
    }
}

/// Whole calendar months from `start` to `end`, truncated.
fn months_between(start: DateTime<Local>, end: DateTime<Local>) -> u32 {
    let mut months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if months > 0
        && start
            .checked_add_months(Months::new(months as u32))
            .is_some_and(|t| t > end)
    {
        months -= 1;
    }
    months.max(0) as u32
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryInput {
    pub start: String,
    pub end: String,
    pub step: BucketUnit,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RawWindow {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DisplayRange {
    /// One axis label per bucket, start to end inclusive.
    pub range: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryDuration {
    pub input: QueryInput,
    pub raw: RawWindow,
    pub display: DisplayRange,
}

impl QueryDuration {
    pub fn generate(duration: &Duration, now: DateTime<Local>) -> Self {
        let (start, end) = duration.materialize(now);
        let unit = BucketUnit::measure(start, end);

        let buckets = unit.between(start, end).max(0) as u32 + 1;
        let range = (0..buckets)
            .filter_map(|i| unit.advance(start, i))
            .map(|t| t.format(unit.display_format()).to_string())
            .collect();

        Self {
            input: QueryInput {
                start: start.format(unit.input_format()).to_string(),
                end: end.format(unit.input_format()).to_string(),
                step: unit,
            },
            raw: RawWindow { start, end },
            display: DisplayRange { range },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_measure_picks_unit_by_span() {
        let now = at(2024, 6, 15, 12, 0);
        let unit_of = |label: &str| {
            let (start, end) = catalog::find_by_label(label).unwrap().duration().materialize(now);
            BucketUnit::measure(start, end)
        };

        assert_eq!(unit_of("过去15分"), BucketUnit::Minute);
        assert_eq!(unit_of("过去1小时"), BucketUnit::Minute);
        assert_eq!(unit_of("过去6小时"), BucketUnit::Hour);
        assert_eq!(unit_of("过去24小时"), BucketUnit::Hour);
        assert_eq!(unit_of("过去2天"), BucketUnit::Day);
        assert_eq!(unit_of("过去30天"), BucketUnit::Day);
        assert_eq!(unit_of("过去6月"), BucketUnit::Month);
    }

    #[test]
    fn test_months_between_truncates() {
        assert_eq!(months_between(at(2024, 1, 31, 12, 0), at(2024, 2, 29, 0, 0)), 0);
        assert_eq!(months_between(at(2024, 1, 15, 0, 0), at(2024, 3, 15, 0, 0)), 2);
        assert_eq!(months_between(at(2024, 1, 15, 0, 0), at(2024, 3, 14, 0, 0)), 1);
        assert_eq!(months_between(at(2024, 3, 1, 0, 0), at(2024, 1, 1, 0, 0)), 0);
    }

    #[test]
    fn test_generate_minute_window() {
        let now = at(2024, 6, 15, 12, 0);
        let query = QueryDuration::generate(&catalog::default_shortcut().duration(), now);

        assert_eq!(query.input.start, "2024-06-15 1145");
        assert_eq!(query.input.end, "2024-06-15 1200");
        assert_eq!(query.input.step, BucketUnit::Minute);
        assert_eq!(query.raw.end, now);
        assert_eq!(query.display.range.len(), 16);
        assert_eq!(query.display.range.first().map(String::as_str), Some("11:45"));
        assert_eq!(query.display.range.last().map(String::as_str), Some("12:00"));
    }

    #[test]
    fn test_generate_explicit_days() {
        let duration = Duration::explicit(at(2024, 1, 1, 0, 0), at(2024, 1, 8, 0, 0), None);
        let query = QueryDuration::generate(&duration, at(2024, 6, 1, 0, 0));

        assert_eq!(query.input.start, "2024-01-01");
        assert_eq!(query.input.end, "2024-01-08");
        assert_eq!(query.input.step, BucketUnit::Day);
        assert_eq!(query.display.range.len(), 8);
        assert_eq!(query.display.range[7], "01-08");
    }

    #[test]
    fn test_serialized_input_shape() {
        let duration = Duration::explicit(at(2023, 1, 1, 0, 0), at(2024, 1, 1, 0, 0), None);
        let query = QueryDuration::generate(&duration, at(2024, 6, 1, 0, 0));
        let json = serde_json::to_value(&query).unwrap();

        assert_eq!(json["input"]["step"], "MONTH");
        assert_eq!(json["input"]["start"], "2023-01");
        assert_eq!(json["display"]["range"].as_array().map(Vec::len), Some(13));
    }
}
