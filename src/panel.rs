use crate::catalog::Shortcut;
use crate::error::StoreError;
use crate::models::{Duration, FormFields, FormSubmission, PersistedRange, Step, Window};
use crate::query::QueryDuration;
use crate::resolver::{
    resolve_form_submission, resolve_selection, resolve_shortcut_click, RawSelection,
};
use crate::storage::{KeyValueStore, CLEARED, LABEL_KEY, RANGE_KEY};
use crate::utils::format_day;
use chrono::{DateTime, Local};
use tracing::{info, warn};

/// Holds the active selection and keeps the store in sync with it.
pub struct DurationPanel<S> {
    store: S,
    selected: Duration,
}

impl<S: KeyValueStore> DurationPanel<S> {
    /// Restore the last selection. Read failures count as "nothing persisted".
    pub fn mount(store: S, default_step: Step) -> Self {
        let raw = RawSelection {
            label: read_key(&store, LABEL_KEY),
            range: read_key(&store, RANGE_KEY),
        };
        let mut selected = resolve_selection(&raw);
        if selected.step.is_none() && !default_step.is_off() {
            selected.step = Some(default_step);
        }
        info!(label = ?selected.label, step = ?selected.step, "selection restored");
        Self { store, selected }
    }

    pub fn current(&self) -> &Duration {
        &self.selected
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn query_duration(&self, now: DateTime<Local>) -> QueryDuration {
        QueryDuration::generate(&self.selected, now)
    }

    /// Apply a validated form and persist it as the explicit range record.
    pub fn submit(&mut self, fields: &FormFields) -> Result<&Duration, StoreError> {
        let FormSubmission {
            duration,
            persisted,
        } = resolve_form_submission(&self.selected, fields);
        self.store.set(RANGE_KEY, &serde_json::to_string(&persisted)?)?;
        Ok(self.select(duration))
    }

    /// Select a catalog entry. With `supersede` the persisted range is cleared
    /// so the next mount restores this label instead.
    pub fn click_shortcut(
        &mut self,
        entry: &'static Shortcut,
        supersede: bool,
    ) -> Result<&Duration, StoreError> {
        let duration = resolve_shortcut_click(&self.selected, entry);
        self.store.set(LABEL_KEY, &serde_json::to_string(entry.label)?)?;
        if supersede {
            self.store.set(RANGE_KEY, CLEARED)?;
        }
        Ok(self.select(duration))
    }

    /// Change only the refresh step. Custom ranges re-persist their record.
    pub fn set_step(&mut self, step: Step) -> Result<&Duration, StoreError> {
        let duration = Duration {
            step: Some(step),
            ..self.selected.clone()
        };
        if let Window::Absolute { start, end } = duration.window {
            let record = PersistedRange {
                begin_time: format_day(start),
                end_time: format_day(end),
                step: step.to_string(),
            };
            self.store.set(RANGE_KEY, &serde_json::to_string(&record)?)?;
        }
        Ok(self.select(duration))
    }

    fn select(&mut self, duration: Duration) -> &Duration {
        info!(label = ?duration.label, step = ?duration.step, "selection changed");
        self.selected = duration;
        &self.selected
    }
}

fn read_key<S: KeyValueStore>(store: &S, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, %err, "could not read persisted selection");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::models::{FieldValue, RANGE_FIELD, STEP_FIELD};
    use crate::storage::{FileStore, MemoryStore};
    use anyhow::Result;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::tempdir;

    fn range_form(start: DateTime<Local>, end: DateTime<Local>, step: &str) -> FormFields {
        let mut fields = FormFields::new();
        fields.insert(RANGE_FIELD.to_string(), FieldValue::Range(start, end));
        fields.insert(STEP_FIELD.to_string(), FieldValue::Scalar(step.to_string()));
        fields
    }

    #[test]
    fn test_mount_empty_store_uses_default() {
        let panel = DurationPanel::mount(MemoryStore::new(), Step::OFF);
        assert_eq!(panel.current(), &catalog::default_shortcut().duration());
    }

    #[test]
    fn test_mount_applies_default_step() {
        let panel = DurationPanel::mount(MemoryStore::new(), Step::from_millis(10_000));
        assert_eq!(panel.current().step, Some(Step::from_millis(10_000)));
    }

    #[test]
    fn test_submit_then_remount_restores_range() -> Result<()> {
        let start = Local.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2024, 4, 3, 18, 0, 0).unwrap();

        let mut panel = DurationPanel::mount(MemoryStore::new(), Step::OFF);
        panel.submit(&range_form(start, end, "5000"))?;
        assert!(panel.current().is_custom());

        let remounted = DurationPanel::mount(panel.store().clone(), Step::OFF);
        let now = Local::now();
        assert!(remounted.current().is_custom());
        assert_eq!(
            remounted.current().from(now),
            Local.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            remounted.current().to(now),
            Local.with_ymd_and_hms(2024, 4, 3, 0, 0, 0).unwrap()
        );
        assert_eq!(remounted.current().step, Some(Step::from_millis(5000)));

        Ok(())
    }

    #[test]
    fn test_click_shortcut_supersedes_range() -> Result<()> {
        let start = Local.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
        let mut panel = DurationPanel::mount(MemoryStore::new(), Step::OFF);
        panel.submit(&range_form(start, end, "10000"))?;

        let entry = catalog::find_by_label("过去14天").unwrap();
        let selected = panel.click_shortcut(entry, true)?;
        assert_eq!(selected.label, Some("过去14天"));
        assert_eq!(selected.step, Some(Step::from_millis(10_000)));
        assert_eq!(panel.store().get(RANGE_KEY)?.as_deref(), Some(CLEARED));
        assert_eq!(panel.store().get(LABEL_KEY)?.as_deref(), Some("\"过去14天\""));

        let remounted = DurationPanel::mount(panel.store().clone(), Step::OFF);
        assert_eq!(remounted.current().label, Some("过去14天"));

        Ok(())
    }

    #[test]
    fn test_click_shortcut_without_supersede_keeps_range() -> Result<()> {
        let start = Local.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
        let mut panel = DurationPanel::mount(MemoryStore::new(), Step::OFF);
        panel.submit(&range_form(start, end, "0"))?;
        panel.click_shortcut(catalog::find_by_label("过去1小时").unwrap(), false)?;

        let remounted = DurationPanel::mount(panel.store().clone(), Step::OFF);
        assert!(remounted.current().is_custom());

        Ok(())
    }

    #[test]
    fn test_set_step_rewrites_range_record() -> Result<()> {
        let start = Local.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
        let mut panel = DurationPanel::mount(MemoryStore::new(), Step::OFF);
        panel.submit(&range_form(start, end, "0"))?;
        panel.set_step(Step::from_millis(30_000))?;

        let remounted = DurationPanel::mount(panel.store().clone(), Step::OFF);
        assert_eq!(remounted.current().step, Some(Step::from_millis(30_000)));

        let mut shortcut_panel = DurationPanel::mount(MemoryStore::new(), Step::OFF);
        shortcut_panel.set_step(Step::from_millis(5_000))?;
        assert_eq!(shortcut_panel.store().get(RANGE_KEY)?, None);
        assert_eq!(shortcut_panel.current().label, Some("过去15分"));

        Ok(())
    }

    #[test]
    fn test_mount_from_corrupt_file_store() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("store.json");
        fs::write(&path, "]]")?;

        let panel = DurationPanel::mount(FileStore::from_path(path), Step::OFF);
        assert_eq!(panel.current(), &catalog::default_shortcut().duration());

        Ok(())
    }

    #[test]
    fn test_mount_with_oversized_step_formats() {
        let store = MemoryStore::new().with(
            RANGE_KEY,
            r#"{"beginTime":"2024/01/01","endTime":"2024/01/02","step":"9223372036854775808"}"#,
        );
        let panel = DurationPanel::mount(store, Step::OFF);

        assert!(panel.current().is_custom());
        assert_eq!(panel.current().step, None);
        assert_eq!(crate::utils::format_step(panel.current().step), "off");
    }
}
