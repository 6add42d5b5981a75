//! Task executor - runs one task, notifies, then performs deferred actions.
//!
//! One execution walks Dispatching -> Reporting -> Notifying -> Deferred:
//! the behavior for the task type builds a `TaskReport`, the report is sent to
//! every resolved notifier unless suppressed, and only then does a deferred
//! restart run. A restart therefore never cuts off its own notification.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use homewatch_storage::DEFAULT_NOTIFIER_KEY;
use homewatch_traits::{
    BenchmarkProvider, ConfigStore, DiagnosticsProvider, HomeAssistantSource, HostControl,
    NotificationSink, PackageRegistry, PluginRegistry,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::actions::{self, ActionContext};
use crate::engine::cron_scheduler::TaskRunner;
use crate::models::{
    DeferredAction, ExecutionOutcome, NotificationOutcome, Task, TaskReport, TaskType,
};

/// External systems a task may talk to.
#[derive(Clone)]
pub struct Collaborators {
    pub registry: Arc<dyn PluginRegistry>,
    pub diagnostics: Arc<dyn DiagnosticsProvider>,
    pub benchmark: Option<Arc<dyn BenchmarkProvider>>,
    pub home_assistant: Arc<dyn HomeAssistantSource>,
    pub packages: Arc<dyn PackageRegistry>,
    pub notifier: Arc<dyn NotificationSink>,
    pub host: Arc<dyn HostControl>,
}

/// Executor settings that do not live in the configuration store.
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Package name of the plugin running this scheduler.
    pub host_plugin: String,
    /// Notifier used when neither the task nor the store names one.
    pub default_notifier: Option<String>,
}

pub struct TaskExecutor {
    store: Arc<dyn ConfigStore>,
    collaborators: Collaborators,
    config: ExecutorConfig,
}

impl TaskExecutor {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        collaborators: Collaborators,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            store,
            collaborators,
            config,
        }
    }

    /// Run the behavior for `task` and return its report.
    pub async fn build_report(&self, task: &Task) -> Result<TaskReport> {
        let task_type = task
            .task_type
            .ok_or_else(|| anyhow!("Task '{}' has no valid type", task.name))?;
        let ctx = ActionContext {
            task,
            collaborators: &self.collaborators,
            config: &self.config,
        };

        debug!(task = %task.name, task_type = %task_type, "Dispatching task");
        match task_type {
            TaskType::UpdatePlugins => actions::updates::run(&ctx).await,
            TaskType::RestartPlugins => actions::plugins::restart_plugins(&ctx).await,
            TaskType::Diagnostics => actions::diagnostics::run(&ctx).await,
            TaskType::RestartCameras => actions::cameras::run(&ctx).await,
            TaskType::ReportPluginsStatus => actions::status::run(&ctx).await,
            TaskType::ReportHaBatteryStatus => actions::battery::run(&ctx).await,
            TaskType::ReportHaConsumables => actions::consumables::run(&ctx).await,
            TaskType::TomorrowEventsHa => actions::calendar::run(&ctx).await,
            TaskType::RestartScrypted => actions::plugins::restart_host(&ctx).await,
            TaskType::ReportHaUnavailableEntities => actions::unavailable::run(&ctx).await,
        }
    }

    /// Execute `task` end to end.
    pub async fn execute(&self, task: &Task) -> Result<ExecutionOutcome> {
        let report = self.build_report(task).await?;
        let notification = self.notify(task, &report).await;

        let deferred_ran = match report.deferred {
            Some(action) => {
                self.run_deferred(task, action).await?;
                Some(action)
            }
            None => None,
        };

        Ok(ExecutionOutcome {
            task: task.name.clone(),
            report,
            notification,
            deferred_ran,
        })
    }

    /// Targets in priority order: task notifiers, stored default, configured default.
    pub fn resolve_targets(&self, task: &Task) -> Vec<String> {
        if !task.additional_notifiers.is_empty() {
            return task.additional_notifiers.clone();
        }

        let stored = match self.store.get(DEFAULT_NOTIFIER_KEY) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(err) => {
                warn!(error = %err, "Failed to read default notifier");
                None
            }
        };
        stored
            .or_else(|| self.config.default_notifier.clone())
            .into_iter()
            .collect()
    }

    async fn notify(&self, task: &Task, report: &TaskReport) -> NotificationOutcome {
        if task.skip_notify {
            debug!(task = %task.name, "Notification skipped by task setting");
            return NotificationOutcome::Skipped;
        }
        if report.force_stop {
            debug!(task = %task.name, "Nothing to report, notification suppressed");
            return NotificationOutcome::Suppressed;
        }

        let targets = self.resolve_targets(task);
        if targets.is_empty() {
            warn!(task = %task.name, "No notifier configured, report not sent");
            return NotificationOutcome::NoTarget;
        }

        let mut delivered = Vec::new();
        let mut failed = Vec::new();
        for target in targets {
            match self
                .collaborators
                .notifier
                .send(&target, &task.name, &report.message, report.priority)
                .await
            {
                Ok(()) => delivered.push(target),
                Err(err) => {
                    error!(
                        task = %task.name,
                        target = %target,
                        error = %err,
                        "Failed to send notification"
                    );
                    failed.push(target);
                }
            }
        }

        NotificationOutcome::Sent { delivered, failed }
    }

    async fn run_deferred(&self, task: &Task, action: DeferredAction) -> Result<()> {
        info!(task = %task.name, action = ?action, "Running deferred action");
        let host = &self.collaborators.host;
        let result = match action {
            DeferredAction::RestartSelf => host.restart_self().await,
            DeferredAction::RestartHostProcess => host.restart_host_process().await,
        };
        result.map_err(|e| anyhow!("Deferred {:?} failed for task '{}': {}", action, task.name, e))
    }
}

#[async_trait]
impl TaskRunner for TaskExecutor {
    async fn run_task(&self, task: Task) {
        match self.execute(&task).await {
            Ok(outcome) => info!(
                task = %outcome.task,
                notification = ?outcome.notification,
                deferred = ?outcome.deferred_ran,
                "Task executed"
            ),
            Err(err) => error!(task = %task.name, error = ?err, "Task execution failed"),
        }
    }
}
