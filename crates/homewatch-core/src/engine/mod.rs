pub mod cron_scheduler;
pub mod decoder;
pub mod fingerprint;
pub mod reconciler;
pub mod schedule;

pub use cron_scheduler::{CronTimers, TaskRunner, TimerBackend, TimerId};
pub use decoder::{decode_all, decode_task, enabled_tasks, task_names};
pub use fingerprint::fingerprint;
pub use reconciler::{
    ActiveTimer, DEFAULT_POLL_INTERVAL, LoggingObserver, ReconcileObserver, ReconcilerHandle,
    TaskReconciler, TickOutcome,
};
pub use schedule::{next_run, normalize_cron};
