//! In-memory collaborators and timers for tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homewatch_storage::MemoryConfigStore;
use homewatch_traits::{
    BenchmarkProvider, CalendarEvent, CollaboratorError, DeviceInfo, DiagnosticsProvider,
    EntityState, HomeAssistantSource, HostControl, NotificationPriority, NotificationSink,
    PackageRegistry, PackageVersion, PluginInfo, PluginRegistry, PluginStats, StepOutcome,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::engine::cron_scheduler::{TimerBackend, TimerId};
use crate::models::{DeferredAction, Task};
use crate::runtime::actions::ActionContext;
use crate::runtime::executor::{Collaborators, ExecutorConfig, TaskExecutor};

type CollabResult<T> = homewatch_traits::Result<T>;

/// Package name the harness treats as the host plugin.
pub const HOST_PLUGIN: &str = "@homewatch/scheduler";

/// Side effect recorded across every mock, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RestartPlugin(String),
    InstallVersion(String, String),
    RebootDevice(String),
    Notify(String),
    RestartSelf,
    RestartHostProcess,
}

pub type CallLog = Arc<RwLock<Vec<Call>>>;

// ---------------------------------------------------------------------------
// Plugin registry
// ---------------------------------------------------------------------------

pub struct MockRegistry {
    log: CallLog,
    plugins: RwLock<Vec<PluginInfo>>,
    devices: RwLock<Vec<DeviceInfo>>,
    stats: RwLock<PluginStats>,
    failing_reboots: RwLock<Vec<String>>,
    failing_restarts: RwLock<Vec<String>>,
}

impl MockRegistry {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            plugins: RwLock::new(Vec::new()),
            devices: RwLock::new(Vec::new()),
            stats: RwLock::new(PluginStats::default()),
            failing_reboots: RwLock::new(Vec::new()),
            failing_restarts: RwLock::new(Vec::new()),
        }
    }

    pub async fn add_plugin(&self, name: &str, version: &str) {
        let mut plugins = self.plugins.write().await;
        plugins.retain(|p| p.name != name);
        plugins.push(PluginInfo {
            id: name.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        });
    }

    /// Adds a device, replacing any device with the same id.
    pub async fn add_device(&self, device: DeviceInfo) {
        let mut devices = self.devices.write().await;
        devices.retain(|d| d.id != device.id);
        devices.push(device);
    }

    pub async fn set_stats(&self, stats: PluginStats) {
        *self.stats.write().await = stats;
    }

    pub async fn fail_reboot(&self, id: &str) {
        self.failing_reboots.write().await.push(id.to_string());
    }

    pub async fn fail_restart(&self, name: &str) {
        self.failing_restarts.write().await.push(name.to_string());
    }

    async fn calls_matching<T>(&self, pick: impl Fn(&Call) -> Option<T>) -> Vec<T> {
        self.log.read().await.iter().filter_map(pick).collect()
    }

    pub async fn rebooted(&self) -> Vec<String> {
        self.calls_matching(|c| match c {
            Call::RebootDevice(id) => Some(id.clone()),
            _ => None,
        })
        .await
    }

    pub async fn restarted(&self) -> Vec<String> {
        self.calls_matching(|c| match c {
            Call::RestartPlugin(name) => Some(name.clone()),
            _ => None,
        })
        .await
    }

    pub async fn installed(&self) -> Vec<(String, String)> {
        self.calls_matching(|c| match c {
            Call::InstallVersion(name, version) => Some((name.clone(), version.clone())),
            _ => None,
        })
        .await
    }
}

#[async_trait]
impl PluginRegistry for MockRegistry {
    async fn list_plugins(&self) -> CollabResult<Vec<PluginInfo>> {
        Ok(self.plugins.read().await.clone())
    }

    async fn restart_plugin(&self, name: &str) -> CollabResult<()> {
        if self.failing_restarts.read().await.iter().any(|n| n == name) {
            return Err(CollaboratorError::Other(format!("{} did not restart", name)));
        }
        self.log
            .write()
            .await
            .push(Call::RestartPlugin(name.to_string()));
        Ok(())
    }

    async fn install_version(&self, name: &str, version: &str) -> CollabResult<()> {
        self.log
            .write()
            .await
            .push(Call::InstallVersion(name.to_string(), version.to_string()));
        Ok(())
    }

    async fn get_device(&self, id: &str) -> CollabResult<Option<DeviceInfo>> {
        Ok(self.devices.read().await.iter().find(|d| d.id == id).cloned())
    }

    async fn reboot_device(&self, id: &str) -> CollabResult<()> {
        if self.failing_reboots.read().await.iter().any(|d| d == id) {
            return Err(CollaboratorError::Other("device offline".to_string()));
        }
        self.log
            .write()
            .await
            .push(Call::RebootDevice(id.to_string()));
        Ok(())
    }

    async fn plugin_stats(&self) -> CollabResult<PluginStats> {
        Ok(self.stats.read().await.clone())
    }
}

// ---------------------------------------------------------------------------
// Diagnostics and benchmark
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockDiagnostics {
    devices: RwLock<HashMap<String, Vec<StepOutcome>>>,
    failing: RwLock<Vec<String>>,
    system: RwLock<Vec<StepOutcome>>,
}

impl MockDiagnostics {
    pub async fn set_device_outcomes(&self, id: &str, outcomes: Vec<StepOutcome>) {
        self.devices.write().await.insert(id.to_string(), outcomes);
    }

    pub async fn fail_device(&self, id: &str) {
        self.failing.write().await.push(id.to_string());
    }

    pub async fn set_system_outcomes(&self, outcomes: Vec<StepOutcome>) {
        *self.system.write().await = outcomes;
    }
}

#[async_trait]
impl DiagnosticsProvider for MockDiagnostics {
    async fn validate_device(&self, device_id: &str) -> CollabResult<Vec<StepOutcome>> {
        if self.failing.read().await.iter().any(|d| d == device_id) {
            return Err(CollaboratorError::Network("validation timed out".to_string()));
        }
        Ok(self
            .devices
            .read()
            .await
            .get(device_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn validate_system(&self) -> CollabResult<Vec<StepOutcome>> {
        Ok(self.system.read().await.clone())
    }
}

pub struct MockBenchmark;

#[async_trait]
impl BenchmarkProvider for MockBenchmark {
    async fn run_benchmark(&self) -> CollabResult<String> {
        Ok("all good\n".to_string())
    }
}

// ---------------------------------------------------------------------------
// Home automation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockHomeAssistant {
    states: RwLock<Vec<EntityState>>,
    events: RwLock<Vec<CalendarEvent>>,
    queries: RwLock<Vec<(String, DateTime<Utc>, DateTime<Utc>)>>,
    fail_states: AtomicBool,
}

impl MockHomeAssistant {
    pub async fn set_states(&self, states: Vec<EntityState>) {
        *self.states.write().await = states;
    }

    pub async fn set_events(&self, events: Vec<CalendarEvent>) {
        *self.events.write().await = events;
    }

    pub async fn fail_states(&self) {
        self.fail_states.store(true, Ordering::SeqCst);
    }

    pub async fn calendar_queries(&self) -> Vec<(String, DateTime<Utc>, DateTime<Utc>)> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl HomeAssistantSource for MockHomeAssistant {
    async fn get_all_entity_states(&self) -> CollabResult<Vec<EntityState>> {
        if self.fail_states.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Http {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        Ok(self.states.read().await.clone())
    }

    async fn get_calendar_events(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CollabResult<Vec<CalendarEvent>> {
        self.queries
            .write()
            .await
            .push((calendar_id.to_string(), from, to));
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.start >= from && e.start < to)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Package registry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockPackages {
    versions: RwLock<HashMap<String, Vec<PackageVersion>>>,
}

impl MockPackages {
    pub async fn set_versions(&self, package: &str, versions: Vec<PackageVersion>) {
        self.versions
            .write()
            .await
            .insert(package.to_string(), versions);
    }
}

#[async_trait]
impl PackageRegistry for MockPackages {
    async fn get_versions(&self, package: &str) -> CollabResult<Vec<PackageVersion>> {
        self.versions
            .read()
            .await
            .get(package)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(package.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Notifications and host
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    pub target: String,
    pub title: String,
    pub body: String,
    pub priority: Option<NotificationPriority>,
}

pub struct MockNotifier {
    log: CallLog,
    sent: RwLock<Vec<SentNotification>>,
    failing: RwLock<Vec<String>>,
}

impl MockNotifier {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            sent: RwLock::new(Vec::new()),
            failing: RwLock::new(Vec::new()),
        }
    }

    pub async fn fail_target(&self, target: &str) {
        self.failing.write().await.push(target.to_string());
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationSink for MockNotifier {
    async fn send(
        &self,
        target: &str,
        title: &str,
        body: &str,
        priority: Option<NotificationPriority>,
    ) -> CollabResult<()> {
        if self.failing.read().await.iter().any(|t| t == target) {
            return Err(CollaboratorError::Network(format!("{} unreachable", target)));
        }
        self.log.write().await.push(Call::Notify(target.to_string()));
        self.sent.write().await.push(SentNotification {
            target: target.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            priority,
        });
        Ok(())
    }
}

pub struct MockHost {
    log: CallLog,
    failing: AtomicBool,
}

impl MockHost {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            failing: AtomicBool::new(false),
        }
    }

    /// Both restart calls are recorded, then fail.
    pub fn fail_restarts(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn outcome(&self) -> CollabResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Other("host unreachable".to_string()));
        }
        Ok(())
    }

    pub async fn restarts(&self) -> Vec<DeferredAction> {
        self.log
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                Call::RestartSelf => Some(DeferredAction::RestartSelf),
                Call::RestartHostProcess => Some(DeferredAction::RestartHostProcess),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl HostControl for MockHost {
    async fn restart_self(&self) -> CollabResult<()> {
        self.log.write().await.push(Call::RestartSelf);
        self.outcome()
    }

    async fn restart_host_process(&self) -> CollabResult<()> {
        self.log.write().await.push(Call::RestartHostProcess);
        self.outcome()
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Every mock collaborator wired together, sharing one call log.
pub struct TestHarness {
    log: CallLog,
    pub store: Arc<MemoryConfigStore>,
    pub registry: Arc<MockRegistry>,
    pub diagnostics: Arc<MockDiagnostics>,
    pub home_assistant: Arc<MockHomeAssistant>,
    pub packages: Arc<MockPackages>,
    pub notifier: Arc<MockNotifier>,
    pub host: Arc<MockHost>,
    pub collaborators: Collaborators,
    pub config: ExecutorConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        let log: CallLog = Arc::new(RwLock::new(Vec::new()));
        let registry = Arc::new(MockRegistry::new(log.clone()));
        let diagnostics = Arc::new(MockDiagnostics::default());
        let home_assistant = Arc::new(MockHomeAssistant::default());
        let packages = Arc::new(MockPackages::default());
        let notifier = Arc::new(MockNotifier::new(log.clone()));
        let host = Arc::new(MockHost::new(log.clone()));

        let collaborators = Collaborators {
            registry: registry.clone(),
            diagnostics: diagnostics.clone(),
            benchmark: Some(Arc::new(MockBenchmark)),
            home_assistant: home_assistant.clone(),
            packages: packages.clone(),
            notifier: notifier.clone(),
            host: host.clone(),
        };

        Self {
            log,
            store: Arc::new(MemoryConfigStore::new()),
            registry,
            diagnostics,
            home_assistant,
            packages,
            notifier,
            host,
            collaborators,
            config: ExecutorConfig {
                host_plugin: HOST_PLUGIN.to_string(),
                default_notifier: None,
            },
        }
    }

    pub fn context<'a>(&'a self, task: &'a Task) -> ActionContext<'a> {
        ActionContext {
            task,
            collaborators: &self.collaborators,
            config: &self.config,
        }
    }

    pub fn executor(&self) -> TaskExecutor {
        TaskExecutor::new(
            self.store.clone(),
            self.collaborators.clone(),
            self.config.clone(),
        )
    }

    pub fn executor_with_default(&self, default_notifier: Option<&str>) -> TaskExecutor {
        let config = ExecutorConfig {
            default_notifier: default_notifier.map(str::to_string),
            ..self.config.clone()
        };
        TaskExecutor::new(self.store.clone(), self.collaborators.clone(), config)
    }

    /// Every recorded side effect, in order.
    pub async fn calls(&self) -> Vec<Call> {
        self.log.read().await.clone()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Started { task: String, id: TimerId },
    Stopped { id: TimerId },
}

/// Timer backend that records instead of scheduling.
#[derive(Default)]
pub struct RecordingTimers {
    active: RwLock<Vec<(TimerId, String)>>,
    events: RwLock<Vec<TimerEvent>>,
    failing_task: Option<String>,
    failing_stops: AtomicBool,
    shut_down: AtomicBool,
}

impl RecordingTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses to start a timer for `task`.
    pub fn failing_for(task: &str) -> Self {
        Self {
            failing_task: Some(task.to_string()),
            ..Self::default()
        }
    }

    /// Every later `stop_timer` call fails and leaves the timer running.
    pub fn fail_stops(&self) {
        self.failing_stops.store(true, Ordering::SeqCst);
    }

    /// Names of tasks with a live timer, sorted.
    pub async fn active_task_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .active
            .read()
            .await
            .iter()
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub async fn events(&self) -> Vec<TimerEvent> {
        self.events.read().await.clone()
    }

    pub async fn clear_events(&self) {
        self.events.write().await.clear();
    }

    pub async fn start_count(&self) -> usize {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| matches!(e, TimerEvent::Started { .. }))
            .count()
    }

    pub async fn stop_count(&self) -> usize {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| matches!(e, TimerEvent::Stopped { .. }))
            .count()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TimerBackend for RecordingTimers {
    async fn start_timer(&self, task: Task) -> Result<TimerId> {
        if self.failing_task.as_deref() == Some(task.name.as_str()) {
            return Err(anyhow!("Invalid cron expression for task '{}'", task.name));
        }
        let id = Uuid::new_v4();
        self.active.write().await.push((id, task.name.clone()));
        self.events
            .write()
            .await
            .push(TimerEvent::Started { task: task.name, id });
        Ok(id)
    }

    async fn stop_timer(&self, id: TimerId) -> Result<()> {
        if self.failing_stops.load(Ordering::SeqCst) {
            return Err(anyhow!("Failed to remove job {}", id));
        }
        self.active.write().await.retain(|(active, _)| *active != id);
        self.events.write().await.push(TimerEvent::Stopped { id });
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}
