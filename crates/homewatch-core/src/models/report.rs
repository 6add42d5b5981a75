use homewatch_traits::NotificationPriority;
use serde::{Deserialize, Serialize};

/// Side effect postponed until the report has been delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredAction {
    /// Restart the plugin running this scheduler.
    RestartSelf,
    /// Restart the whole host process.
    RestartHostProcess,
}

/// Report produced by one task behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub message: String,
    pub priority: Option<NotificationPriority>,
    /// Nothing noteworthy: suppress the notification.
    pub force_stop: bool,
    pub deferred: Option<DeferredAction>,
}

impl TaskReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Report with nothing to say; never notified.
    pub fn silent() -> Self {
        Self {
            force_stop: true,
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_deferred(mut self, action: DeferredAction) -> Self {
        self.deferred = Some(action);
        self
    }
}

/// How the notification step ended for one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationOutcome {
    /// `skip_notify` set on the task.
    Skipped,
    /// The behavior force-stopped notification.
    Suppressed,
    /// No additional notifiers and no default notifier.
    NoTarget,
    Sent { delivered: Vec<String>, failed: Vec<String> },
}

/// Result of one task execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub task: String,
    pub report: TaskReport,
    pub notification: NotificationOutcome,
    pub deferred_ran: Option<DeferredAction>,
}
