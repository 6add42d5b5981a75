//! Checksum reconciler - keeps cron timers in sync with the configured tasks.
//!
//! The reconciler is responsible for:
//! - Decoding the enabled task list on a fixed interval
//! - Detecting configuration drift through an order-sensitive fingerprint
//! - Replacing the whole timer set when the fingerprint changes
//!
//! Timers are never patched incrementally: on change every active timer is
//! stopped before any new one is created.

use anyhow::Result;
use homewatch_traits::ConfigStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::cron_scheduler::{TimerBackend, TimerId};
use super::decoder::enabled_tasks;
use super::fingerprint::fingerprint;

/// How often the configuration is polled for changes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Host callback invoked whenever the reconciler stops or starts timers.
pub trait ReconcileObserver: Send + Sync {
    fn timers_stopped(&self, _count: usize) {}
    fn timer_started(&self, _task: &str, _cron: &str) {}
    fn timer_failed(&self, _task: &str, _error: &str) {}
}

/// Observer that only writes to the log.
pub struct LoggingObserver;

impl ReconcileObserver for LoggingObserver {
    fn timers_stopped(&self, count: usize) {
        info!(count, "Stopped task timers");
    }

    fn timer_started(&self, task: &str, cron: &str) {
        info!(task = %task, cron = %cron, "Started task timer");
    }

    fn timer_failed(&self, task: &str, error: &str) {
        error!(task = %task, error = %error, "Failed to start task timer");
    }
}

/// Result of one reconciliation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Fingerprint unchanged, timers left untouched.
    Unchanged,
    /// Whole timer set replaced.
    Replaced {
        stopped: usize,
        started: usize,
        failed: usize,
    },
}

/// A timer currently owned by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTimer {
    pub task: String,
    pub cron: String,
    pub id: TimerId,
}

#[derive(Default)]
struct ReconcilerState {
    fingerprint: Option<String>,
    timers: Vec<ActiveTimer>,
}

pub struct TaskReconciler {
    store: Arc<dyn ConfigStore>,
    timers: Arc<dyn TimerBackend>,
    observer: Arc<dyn ReconcileObserver>,
    /// Held for the whole tick, so ticks never interleave.
    state: Mutex<ReconcilerState>,
}

impl TaskReconciler {
    pub fn new(store: Arc<dyn ConfigStore>, timers: Arc<dyn TimerBackend>) -> Self {
        Self {
            store,
            timers,
            observer: Arc::new(LoggingObserver),
            state: Mutex::new(ReconcilerState::default()),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ReconcileObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run one reconciliation pass.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let mut state = self.state.lock().await;

        let tasks = enabled_tasks(self.store.as_ref())?;
        let current = fingerprint(&tasks)?;

        if state.fingerprint.as_deref() == Some(current.as_str()) {
            debug!("Task configuration unchanged");
            return Ok(TickOutcome::Unchanged);
        }

        info!(
            enabled = tasks.len(),
            "Task configuration changed, replacing timers"
        );

        let stopped = self.stop_all(&mut state).await;
        state.fingerprint = Some(current);

        let mut started = 0;
        let mut failed = 0;
        for task in tasks {
            if !task.has_schedule() {
                debug!(task = %task.name, "No cron expression, skipping timer");
                continue;
            }
            if task.task_type.is_none() {
                warn!(task = %task.name, "Task has no valid type, skipping timer");
                continue;
            }

            let name = task.name.clone();
            let cron = task.cron_expression.clone();
            match self.timers.start_timer(task).await {
                Ok(id) => {
                    self.observer.timer_started(&name, &cron);
                    state.timers.push(ActiveTimer {
                        task: name,
                        cron,
                        id,
                    });
                    started += 1;
                }
                Err(err) => {
                    self.observer.timer_failed(&name, &err.to_string());
                    failed += 1;
                }
            }
        }

        Ok(TickOutcome::Replaced {
            stopped,
            started,
            failed,
        })
    }

    /// Stop every active timer. Stop failures are logged and dropped.
    async fn stop_all(&self, state: &mut ReconcilerState) -> usize {
        let timers = std::mem::take(&mut state.timers);
        let count = timers.len();

        for timer in timers {
            if let Err(err) = self.timers.stop_timer(timer.id).await {
                warn!(task = %timer.task, error = %err, "Failed to stop task timer");
            }
        }

        if count > 0 {
            self.observer.timers_stopped(count);
        }
        count
    }

    /// Snapshot of the timers currently owned by the reconciler.
    pub async fn active_timers(&self) -> Vec<ActiveTimer> {
        self.state.lock().await.timers.clone()
    }

    /// Stop all timers and shut the timer backend down.
    pub async fn teardown(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.stop_all(&mut state).await;
        state.fingerprint = None;
        self.timers.shutdown().await
    }

    /// Spawn the polling loop. The first tick runs immediately.
    pub fn start(self: Arc<Self>, poll_interval: Duration) -> ReconcilerHandle {
        let cancel = CancellationToken::new();
        let reconciler = self.clone();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            reconciler.run_loop(poll_interval, token).await;
        });

        ReconcilerHandle {
            reconciler: self,
            cancel,
            join,
        }
    }

    async fn run_loop(&self, poll_interval: Duration, cancel: CancellationToken) {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "TaskReconciler started (poll_interval={}s)",
            poll_interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(TickOutcome::Unchanged) => {}
                        Ok(TickOutcome::Replaced { stopped, started, failed }) => {
                            info!(stopped, started, failed, "Task timers reconciled");
                        }
                        Err(err) => {
                            error!(error = ?err, "Task reconciliation failed");
                        }
                    }
                }
            }
        }

        info!("TaskReconciler stopped");
    }
}

/// Handle to control a running reconciler loop
pub struct ReconcilerHandle {
    reconciler: Arc<TaskReconciler>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl ReconcilerHandle {
    pub fn reconciler(&self) -> &Arc<TaskReconciler> {
        &self.reconciler
    }

    /// Stop polling, then tear down every timer.
    pub async fn stop(self) -> Result<()> {
        self.cancel.cancel();
        if let Err(err) = self.join.await {
            warn!(error = %err, "Reconciler loop ended abnormally");
        }
        self.reconciler.teardown().await
    }
}
