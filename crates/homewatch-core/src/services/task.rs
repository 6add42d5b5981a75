//! Task administration and manual triggering.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use homewatch_storage::{TASK_LIST_KEY, task_key};
use homewatch_traits::ConfigStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::engine::{decode_all, decode_task, next_run, task_names};
use crate::models::{ExecutionOutcome, TASK_FIELDS, Task, TaskType};
use crate::runtime::TaskExecutor;

const LIST_FIELDS: [&str; 5] = [
    "plugins",
    "devices",
    "entitiesToAlwaysReport",
    "entitiesToExclude",
    "additionalNotifiers",
];

const BOOL_FIELDS: [&str; 7] = [
    "enabled",
    "rebootOnErrors",
    "skipNotify",
    "beta",
    "checkAllPlugins",
    "validateSystem",
    "runBenchmark",
];

#[derive(Debug, Error)]
pub enum TaskServiceError {
    #[error("Task '{0}' not found")]
    NotFound(String),
    #[error("Unknown task field '{0}'")]
    UnknownField(String),
}

/// A configured task with its next fire time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task: Task,
    /// `None` when disabled or the cron expression is empty or invalid.
    pub next_run: Option<DateTime<Local>>,
}

/// Normalise a CLI value into its stored form.
fn encode_value(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if field == "type" {
        let task_type: TaskType = value.parse().map_err(anyhow::Error::msg)?;
        return Ok(task_type.to_string());
    }
    if BOOL_FIELDS.contains(&field) {
        return match value {
            "true" | "1" => Ok("true".to_string()),
            "false" | "0" => Ok("false".to_string()),
            other => bail!("Expected true or false for '{}', got '{}'", field, other),
        };
    }
    if LIST_FIELDS.contains(&field) {
        if serde_json::from_str::<Vec<String>>(value).is_ok() {
            return Ok(value.to_string());
        }
        let items: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect();
        return Ok(serde_json::to_string(&items)?);
    }
    Ok(value.to_string())
}

pub struct TaskService {
    store: Arc<dyn ConfigStore>,
    executor: Arc<TaskExecutor>,
}

impl TaskService {
    pub fn new(store: Arc<dyn ConfigStore>, executor: Arc<TaskExecutor>) -> Self {
        Self { store, executor }
    }

    /// Execute a configured task immediately, bypassing its timer.
    pub async fn run_task_now(&self, name: &str) -> Result<ExecutionOutcome> {
        if !task_names(self.store.as_ref())?.iter().any(|n| n == name) {
            return Err(TaskServiceError::NotFound(name.to_string()).into());
        }
        let task = decode_task(self.store.as_ref(), name)?;

        info!(task = %name, "Running task manually");
        self.executor
            .execute(&task)
            .await
            .with_context(|| format!("Task '{}' failed", name))
    }

    pub fn list_tasks(&self) -> Result<Vec<TaskSummary>> {
        let now = Local::now();
        Ok(decode_all(self.store.as_ref())?
            .into_iter()
            .map(|task| {
                let next_run = if task.enabled {
                    next_run(&task.cron_expression, &now)
                } else {
                    None
                };
                TaskSummary { task, next_run }
            })
            .collect())
    }

    /// Write one field; a new name is appended to the task list.
    pub fn set_field(&self, name: &str, field: &str, value: &str) -> Result<()> {
        if !TASK_FIELDS.contains(&field) {
            return Err(TaskServiceError::UnknownField(field.to_string()).into());
        }
        let encoded = encode_value(field, value)?;

        let mut names = task_names(self.store.as_ref())?;
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
            self.store
                .set(TASK_LIST_KEY, &serde_json::to_string(&names)?)
                .context("Failed to update task list")?;
            info!(task = %name, "Added task");
        }

        self.store
            .set(&task_key(name, field), &encoded)
            .with_context(|| format!("Failed to write {} for task '{}'", field, name))
    }

    /// Remove a task from the list and delete all of its fields.
    ///
    /// Names may contain `:`, so only the known field keys are deleted.
    pub fn remove_task(&self, name: &str) -> Result<()> {
        let mut names = task_names(self.store.as_ref())?;
        let before = names.len();
        names.retain(|n| n != name);
        if names.len() == before {
            return Err(TaskServiceError::NotFound(name.to_string()).into());
        }

        self.store
            .set(TASK_LIST_KEY, &serde_json::to_string(&names)?)
            .context("Failed to update task list")?;
        for field in TASK_FIELDS {
            self.store
                .delete(&task_key(name, field))
                .with_context(|| format!("Failed to delete {} of task '{}'", field, name))?;
        }
        info!(task = %name, "Removed task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationOutcome;
    use crate::testkit::TestHarness;
    use homewatch_storage::DEFAULT_NOTIFIER_KEY;

    fn service(harness: &TestHarness) -> TaskService {
        TaskService::new(harness.store.clone(), Arc::new(harness.executor()))
    }

    #[test]
    fn test_set_field_appends_task_once() {
        let harness = TestHarness::new();
        let service = service(&harness);

        service.set_field("Nightly", "type", "RestartCameras").unwrap();
        service.set_field("Nightly", "cronExpression", "0 3 * * *").unwrap();
        service.set_field("Nightly", "devices", "12, 14").unwrap();
        service.set_field("Nightly", "enabled", "1").unwrap();

        assert_eq!(
            harness.store.get(TASK_LIST_KEY).unwrap().as_deref(),
            Some(r#"["Nightly"]"#)
        );
        let task = decode_task(harness.store.as_ref(), "Nightly").unwrap();
        assert_eq!(task.task_type, Some(TaskType::RestartCameras));
        assert_eq!(task.devices, vec!["12", "14"]);
        assert!(task.enabled);
    }

    #[test]
    fn test_set_field_rejects_bad_input() {
        let harness = TestHarness::new();
        let service = service(&harness);

        let err = service.set_field("T", "colour", "red").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TaskServiceError>(),
            Some(TaskServiceError::UnknownField(_))
        ));
        assert!(service.set_field("T", "type", "Reboot").is_err());
        assert!(service.set_field("T", "enabled", "yes").is_err());
        assert_eq!(harness.store.get(TASK_LIST_KEY).unwrap(), None);
    }

    #[test]
    fn test_remove_task_deletes_fields() {
        let harness = TestHarness::new();
        let service = service(&harness);
        service.set_field("A", "type", "RestartScrypted").unwrap();
        service.set_field("B", "type", "RestartScrypted").unwrap();

        service.remove_task("A").unwrap();
        assert!(harness.store.list_keys(Some("task:A:")).unwrap().is_empty());
        assert_eq!(
            harness.store.get(TASK_LIST_KEY).unwrap().as_deref(),
            Some(r#"["B"]"#)
        );
        assert!(service.remove_task("A").is_err());
    }

    #[test]
    fn test_remove_task_keeps_names_sharing_a_prefix() {
        let harness = TestHarness::new();
        let service = service(&harness);
        service.set_field("cam", "type", "RestartCameras").unwrap();
        service.set_field("cam:porch", "type", "RestartCameras").unwrap();
        service.set_field("cam:porch", "devices", "porch-1").unwrap();

        service.remove_task("cam").unwrap();

        assert_eq!(harness.store.get("task:cam:type").unwrap(), None);
        assert_eq!(
            harness.store.list_keys(Some("task:cam:porch:")).unwrap().len(),
            2
        );
        let names: Vec<String> = service
            .list_tasks()
            .unwrap()
            .into_iter()
            .map(|s| s.task.name)
            .collect();
        assert_eq!(names, vec!["cam:porch"]);
    }

    #[test]
    fn test_list_tasks_next_run() {
        let harness = TestHarness::new();
        let service = service(&harness);
        service.set_field("On", "cronExpression", "0 * * * *").unwrap();
        service.set_field("On", "enabled", "true").unwrap();
        service.set_field("Off", "cronExpression", "0 * * * *").unwrap();

        let tasks = service.list_tasks().unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].next_run.is_some_and(|at| at > Local::now()));
        assert!(tasks[1].next_run.is_none());
    }

    #[tokio::test]
    async fn test_run_task_now() {
        let harness = TestHarness::new();
        harness.store.set(DEFAULT_NOTIFIER_KEY, "phone").unwrap();
        let service = service(&harness);
        service.set_field("Host", "type", "RestartScrypted").unwrap();

        let outcome = service.run_task_now("Host").await.unwrap();
        assert_eq!(
            outcome.notification,
            NotificationOutcome::Sent {
                delivered: vec!["phone".into()],
                failed: vec![]
            }
        );

        let err = service.run_task_now("Missing").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TaskServiceError>(),
            Some(TaskServiceError::NotFound(_))
        ));
    }
}
