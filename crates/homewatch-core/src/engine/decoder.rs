//! Task decoder: materializes `Task` records from the configuration store.
//!
//! Every field is read from `task:<name>:<field>`. Missing or malformed values
//! fall back to the field default; only a storage failure is an error.

use anyhow::{Context, Result};
use homewatch_storage::{TASK_LIST_KEY, task_key};
use homewatch_traits::ConfigStore;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

use crate::models::{
    DEFAULT_BATTERY_THRESHOLD, DEFAULT_CALENDAR_DAYS_IN_FUTURE, DEFAULT_MAX_STATS, Task,
};

/// Read one task by name.
pub fn decode_task(store: &dyn ConfigStore, name: &str) -> Result<Task> {
    let fields = FieldReader { store, name };

    Ok(Task {
        name: name.to_string(),
        task_type: fields.raw("type")?.and_then(|raw| match raw.parse() {
            Ok(task_type) => Some(task_type),
            Err(err) => {
                warn!(task = %name, "{}", err);
                None
            }
        }),
        cron_expression: fields
            .string("cronExpression")?
            .map(|cron| cron.trim().to_string())
            .unwrap_or_default(),
        enabled: fields.bool("enabled", false)?,
        reboot_on_errors: fields.bool("rebootOnErrors", false)?,
        skip_notify: fields.bool("skipNotify", false)?,
        beta: fields.bool("beta", false)?,
        plugins: fields.list("plugins")?,
        devices: fields.list("devices")?,
        max_stats: fields.number("maxStats", DEFAULT_MAX_STATS)?,
        check_all_plugins: fields.bool("checkAllPlugins", false)?,
        battery_threshold: fields.number("batteryThreshold", DEFAULT_BATTERY_THRESHOLD)?,
        calendar_days_in_future: fields
            .number("calendarDaysInFuture", DEFAULT_CALENDAR_DAYS_IN_FUTURE)?,
        entities_to_always_report: fields.list("entitiesToAlwaysReport")?,
        entities_to_exclude: fields.list("entitiesToExclude")?,
        additional_notifiers: fields.list("additionalNotifiers")?,
        calendar_entity: fields
            .string("calendarEntity")?
            .map(|entity| entity.trim().to_string())
            .filter(|entity| !entity.is_empty()),
        validate_system: fields.bool("validateSystem", false)?,
        run_benchmark: fields.bool("runBenchmark", false)?,
    })
}

/// Configured task names in list order, without blanks or duplicates.
pub fn task_names(store: &dyn ConfigStore) -> Result<Vec<String>> {
    let raw = store
        .get(TASK_LIST_KEY)
        .context("Failed to read task list")?;
    let names = raw.map(|raw| parse_list(&raw)).unwrap_or_default();

    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.clone()) {
            warn!(task = %name, "Duplicate task name in task list, keeping the first entry");
            continue;
        }
        unique.push(name);
    }
    Ok(unique)
}

/// Decode every configured task, preserving list order.
pub fn decode_all(store: &dyn ConfigStore) -> Result<Vec<Task>> {
    task_names(store)?
        .iter()
        .map(|name| decode_task(store, name))
        .collect()
}

/// Decode every configured task and keep the enabled ones, preserving order.
pub fn enabled_tasks(store: &dyn ConfigStore) -> Result<Vec<Task>> {
    Ok(decode_all(store)?
        .into_iter()
        .filter(|task| task.enabled)
        .collect())
}

struct FieldReader<'a> {
    store: &'a dyn ConfigStore,
    name: &'a str,
}

impl FieldReader<'_> {
    fn raw(&self, field: &str) -> Result<Option<String>> {
        self.store
            .get(&task_key(self.name, field))
            .with_context(|| format!("Failed to read {} of task '{}'", field, self.name))
    }

    /// Plain string; a JSON-encoded string is unwrapped.
    fn string(&self, field: &str) -> Result<Option<String>> {
        Ok(self.raw(field)?.map(|raw| match serde_json::from_str::<Value>(&raw) {
            Ok(Value::String(s)) => s,
            _ => raw,
        }))
    }

    fn bool(&self, field: &str, default: bool) -> Result<bool> {
        Ok(self
            .raw(field)?
            .and_then(|raw| parse_bool(&raw))
            .unwrap_or(default))
    }

    fn list(&self, field: &str) -> Result<Vec<String>> {
        Ok(self
            .raw(field)?
            .map(|raw| parse_list(&raw))
            .unwrap_or_default())
    }

    fn number<T: std::str::FromStr>(&self, field: &str, default: T) -> Result<T> {
        Ok(self
            .raw(field)?
            .and_then(|raw| raw.trim().trim_matches('"').parse::<T>().ok())
            .unwrap_or(default))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().trim_matches('"').to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// JSON array of strings; a JSON string or bare value counts as one element.
fn parse_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let items = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Ok(Value::String(s)) => vec![s],
        Ok(_) => Vec::new(),
        Err(_) => vec![trimmed.to_string()],
    };

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskType;
    use homewatch_storage::MemoryConfigStore;

    fn store_with(pairs: &[(&str, &str)]) -> MemoryConfigStore {
        MemoryConfigStore::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let store = store_with(&[("tasks", r#"["Bare"]"#)]);
        let task = decode_task(&store, "Bare").unwrap();
        assert_eq!(task, Task::new("Bare"));
    }

    #[test]
    fn test_decode_full_task() {
        let store = store_with(&[
            ("task:Batteries:type", "ReportHaBatteryStatus"),
            ("task:Batteries:cronExpression", " 0 9 * * * "),
            ("task:Batteries:enabled", "true"),
            ("task:Batteries:batteryThreshold", "25.5"),
            ("task:Batteries:entitiesToExclude", r#"["sensor.phone_battery"]"#),
            ("task:Batteries:additionalNotifiers", r#"["phone","tablet"]"#),
            ("task:Batteries:maxStats", "12"),
            ("task:Batteries:calendarEntity", "\"calendar.family\""),
        ]);

        let task = decode_task(&store, "Batteries").unwrap();
        assert_eq!(task.task_type, Some(TaskType::ReportHaBatteryStatus));
        assert_eq!(task.cron_expression, "0 9 * * *");
        assert!(task.enabled);
        assert_eq!(task.battery_threshold, 25.5);
        assert_eq!(task.entities_to_exclude, vec!["sensor.phone_battery"]);
        assert_eq!(task.additional_notifiers, vec!["phone", "tablet"]);
        assert_eq!(task.max_stats, 12);
        assert_eq!(task.calendar_entity.as_deref(), Some("calendar.family"));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let store = store_with(&[
            ("task:X:type", "NotAType"),
            ("task:X:enabled", "maybe"),
            ("task:X:maxStats", "-3"),
            ("task:X:batteryThreshold", "low"),
            ("task:X:plugins", "{\"a\":1}"),
        ]);

        let task = decode_task(&store, "X").unwrap();
        assert_eq!(task.task_type, None);
        assert!(!task.enabled);
        assert_eq!(task.max_stats, DEFAULT_MAX_STATS);
        assert_eq!(task.battery_threshold, DEFAULT_BATTERY_THRESHOLD);
        assert!(task.plugins.is_empty());
    }

    #[test]
    fn test_bare_list_value_is_single_element() {
        let store = store_with(&[("task:X:devices", "42")]);
        let task = decode_task(&store, "X").unwrap();
        assert_eq!(task.devices, vec!["42"]);

        let store = store_with(&[("task:X:plugins", "@scrypted/core")]);
        let task = decode_task(&store, "X").unwrap();
        assert_eq!(task.plugins, vec!["@scrypted/core"]);
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let store = store_with(&[
            ("tasks", r#"["A","B"]"#),
            ("task:A:type", "Diagnostics"),
            ("task:A:enabled", "true"),
            ("task:A:devices", r#"["1","2"]"#),
            ("task:B:type", "RestartScrypted"),
        ]);

        assert_eq!(decode_all(&store).unwrap(), decode_all(&store).unwrap());
    }

    #[test]
    fn test_enabled_tasks_preserve_order() {
        let store = store_with(&[
            ("tasks", r#"["C","A","B","A"]"#),
            ("task:A:enabled", "true"),
            ("task:B:enabled", "false"),
            ("task:C:enabled", "true"),
        ]);

        let names: Vec<String> = enabled_tasks(&store)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["C", "A"]);
    }

    #[test]
    fn test_no_task_list() {
        let store = MemoryConfigStore::new();
        assert!(task_names(&store).unwrap().is_empty());
    }
}
