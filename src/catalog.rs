use crate::models::{Duration, Offset, Window};
use chrono::{DateTime, Local};

/// A named relative window offered as a one-click preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    /// Display label. Also the value persisted under `selectedLabel`.
    pub label: &'static str,
    /// Short ASCII alias accepted on the command line.
    pub code: &'static str,
    pub offset: Offset,
}

impl Shortcut {
    const fn new(label: &'static str, code: &'static str, offset: Offset) -> Self {
        Self {
            label,
            code,
            offset,
        }
    }

    pub fn from(&self, now: DateTime<Local>) -> DateTime<Local> {
        self.offset.before(now)
    }

    pub fn to(&self, now: DateTime<Local>) -> DateTime<Local> {
        now
    }

    pub fn duration(&self) -> Duration {
        Duration {
            window: Window::Relative {
                offset: self.offset,
            },
            step: None,
            label: Some(self.label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    ShortRange,
    LongRange,
}

impl CatalogKind {
    pub fn title(&self) -> &'static str {
        match self {
            CatalogKind::ShortRange => "Minutes / Hours",
            CatalogKind::LongRange => "Days / Months",
        }
    }

    pub fn entries(&self) -> &'static [Shortcut] {
        match self {
            CatalogKind::ShortRange => &SHORT_RANGE,
            CatalogKind::LongRange => &LONG_RANGE,
        }
    }
}

pub static SHORT_RANGE: [Shortcut; 6] = [
    Shortcut::new("过去15分", "15m", Offset::Minutes(15)),
    Shortcut::new("过去30分", "30m", Offset::Minutes(30)),
    Shortcut::new("过去1小时", "1h", Offset::Hours(1)),
    Shortcut::new("过去6小时", "6h", Offset::Hours(6)),
    Shortcut::new("过去12小时", "12h", Offset::Hours(12)),
    Shortcut::new("过去24小时", "24h", Offset::Hours(24)),
];

pub static LONG_RANGE: [Shortcut; 6] = [
    Shortcut::new("过去2天", "2d", Offset::Days(2)),
    Shortcut::new("过去7天", "7d", Offset::Days(7)),
    Shortcut::new("过去14天", "14d", Offset::Days(14)),
    Shortcut::new("过去30天", "30d", Offset::Days(30)),
    Shortcut::new("过去6月", "6mo", Offset::Months(6)),
    Shortcut::new("过去12月", "12mo", Offset::Months(12)),
];

/// Catalogs in panel display order.
pub const DISPLAY_ORDER: [CatalogKind; 2] = [CatalogKind::LongRange, CatalogKind::ShortRange];

/// "past 15 minutes", selected when nothing else resolves.
pub fn default_shortcut() -> &'static Shortcut {
    &SHORT_RANGE[0]
}

/// Persisted labels may have been JSON-encoded more than once.
fn normalize_label(label: &str) -> String {
    label.replace('"', "")
}

/// Find a shortcut by label, short-range catalog first.
///
/// A long-range match overrides a short-range one when both catalogs carry the
/// same label.
pub fn find_by_label(label: &str) -> Option<&'static Shortcut> {
    let wanted = normalize_label(label);
    let mut found = None;
    for kind in [CatalogKind::ShortRange, CatalogKind::LongRange] {
        for entry in kind.entries() {
            if normalize_label(entry.label) == wanted {
                found = Some(entry);
            }
        }
    }
    found
}

pub fn find_by_code(code: &str) -> Option<&'static Shortcut> {
    SHORT_RANGE
        .iter()
        .chain(LONG_RANGE.iter())
        .find(|entry| entry.code.eq_ignore_ascii_case(code.trim()))
}

/// Label first, then the ASCII code.
pub fn lookup(query: &str) -> Option<&'static Shortcut> {
    find_by_label(query).or_else(|| find_by_code(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    #[test]
    fn test_every_shortcut_ends_now() {
        let now = Local.with_ymd_and_hms(2024, 5, 20, 9, 30, 0).unwrap();
        for entry in SHORT_RANGE.iter().chain(LONG_RANGE.iter()) {
            assert_eq!(entry.to(now), now, "{}", entry.label);
            assert!(entry.from(now) < entry.to(now), "{}", entry.label);
        }
    }

    #[test]
    fn test_shortcut_reads_now_at_call_time() {
        let entry = find_by_label("过去15分").unwrap();
        let before = Local::now();
        let to = entry.to(Local::now());
        let after = Local::now();
        assert!(to >= before && to <= after);
        assert_eq!(to - entry.from(to), TimeDelta::minutes(15));
    }

    #[test]
    fn test_catalog_order_is_ascending() {
        let now = Local.with_ymd_and_hms(2024, 5, 20, 9, 30, 0).unwrap();
        for kind in DISPLAY_ORDER {
            let froms: Vec<_> = kind.entries().iter().map(|e| e.from(now)).collect();
            assert!(froms.windows(2).all(|w| w[0] > w[1]), "{}", kind.title());
        }
    }

    #[test]
    fn test_find_by_label_strips_quotes() {
        let entry = find_by_label("\"过去7天\"").unwrap();
        assert_eq!(entry.label, "过去7天");
        assert_eq!(entry.offset, Offset::Days(7));
        assert!(find_by_label("过去3天").is_none());
    }

    #[test]
    fn test_lookup_accepts_codes() {
        assert_eq!(lookup("12MO").map(|e| e.label), Some("过去12月"));
        assert_eq!(lookup("过去6小时").map(|e| e.code), Some("6h"));
        assert!(lookup("99d").is_none());
    }

    #[test]
    fn test_default_is_fifteen_minutes() {
        assert_eq!(default_shortcut().offset, Offset::Minutes(15));
        assert_eq!(default_shortcut().duration().label, Some("过去15分"));
    }
}
