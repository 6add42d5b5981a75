use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_STATS: u32 = 5;
pub const DEFAULT_BATTERY_THRESHOLD: f64 = 30.0;
pub const DEFAULT_CALENDAR_DAYS_IN_FUTURE: u32 = 7;

/// Storage field names, as used in `task:<name>:<field>`.
pub const TASK_FIELDS: [&str; 18] = [
    "type",
    "cronExpression",
    "enabled",
    "rebootOnErrors",
    "skipNotify",
    "beta",
    "plugins",
    "devices",
    "maxStats",
    "checkAllPlugins",
    "batteryThreshold",
    "calendarDaysInFuture",
    "entitiesToAlwaysReport",
    "entitiesToExclude",
    "additionalNotifiers",
    "calendarEntity",
    "validateSystem",
    "runBenchmark",
];

/// Closed set of task behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    UpdatePlugins,
    RestartPlugins,
    Diagnostics,
    RestartCameras,
    ReportPluginsStatus,
    ReportHaBatteryStatus,
    ReportHaConsumables,
    TomorrowEventsHa,
    RestartScrypted,
    ReportHaUnavailableEntities,
}

impl TaskType {
    pub const ALL: [TaskType; 10] = [
        TaskType::UpdatePlugins,
        TaskType::RestartPlugins,
        TaskType::Diagnostics,
        TaskType::RestartCameras,
        TaskType::ReportPluginsStatus,
        TaskType::ReportHaBatteryStatus,
        TaskType::ReportHaConsumables,
        TaskType::TomorrowEventsHa,
        TaskType::RestartScrypted,
        TaskType::ReportHaUnavailableEntities,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::UpdatePlugins => "UpdatePlugins",
            TaskType::RestartPlugins => "RestartPlugins",
            TaskType::Diagnostics => "Diagnostics",
            TaskType::RestartCameras => "RestartCameras",
            TaskType::ReportPluginsStatus => "ReportPluginsStatus",
            TaskType::ReportHaBatteryStatus => "ReportHaBatteryStatus",
            TaskType::ReportHaConsumables => "ReportHaConsumables",
            TaskType::TomorrowEventsHa => "TomorrowEventsHa",
            TaskType::RestartScrypted => "RestartScrypted",
            TaskType::ReportHaUnavailableEntities => "ReportHaUnavailableEntities",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == trimmed)
            .ok_or_else(|| format!("Unknown task type: {}", trimmed))
    }
}

/// A named, scheduled unit of monitoring or maintenance work.
///
/// Materialized fresh from the configuration store on every reconciliation;
/// fields that do not apply to `task_type` are carried but ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,
    /// `None` when the stored type is missing or not recognised.
    #[serde(rename = "type")]
    pub task_type: Option<TaskType>,
    pub cron_expression: String,
    pub enabled: bool,
    pub reboot_on_errors: bool,
    pub skip_notify: bool,
    pub beta: bool,
    pub plugins: Vec<String>,
    pub devices: Vec<String>,
    pub max_stats: u32,
    pub check_all_plugins: bool,
    pub battery_threshold: f64,
    pub calendar_days_in_future: u32,
    pub entities_to_always_report: Vec<String>,
    pub entities_to_exclude: Vec<String>,
    pub additional_notifiers: Vec<String>,
    pub calendar_entity: Option<String>,
    pub validate_system: bool,
    pub run_benchmark: bool,
}

impl Task {
    /// A task with every field at its default value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task_type: None,
            cron_expression: String::new(),
            enabled: false,
            reboot_on_errors: false,
            skip_notify: false,
            beta: false,
            plugins: Vec::new(),
            devices: Vec::new(),
            max_stats: DEFAULT_MAX_STATS,
            check_all_plugins: false,
            battery_threshold: DEFAULT_BATTERY_THRESHOLD,
            calendar_days_in_future: DEFAULT_CALENDAR_DAYS_IN_FUTURE,
            entities_to_always_report: Vec::new(),
            entities_to_exclude: Vec::new(),
            additional_notifiers: Vec::new(),
            calendar_entity: None,
            validate_system: false,
            run_benchmark: false,
        }
    }

    pub fn with_type(mut self, task_type: TaskType) -> Self {
        self.task_type = Some(task_type);
        self
    }

    pub fn with_cron(mut self, cron_expression: impl Into<String>) -> Self {
        self.cron_expression = cron_expression.into();
        self
    }

    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    pub fn has_schedule(&self) -> bool {
        !self.cron_expression.trim().is_empty()
    }
}
