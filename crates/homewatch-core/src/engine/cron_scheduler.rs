use crate::engine::schedule::normalize_cron;
use crate::models::Task;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info};
use uuid::Uuid;

/// Identifier of one running timer.
pub type TimerId = Uuid;

/// Something that runs a task when its timer fires.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run_task(&self, task: Task);
}

/// Timer backend owned by the reconciler.
#[async_trait]
pub trait TimerBackend: Send + Sync {
    /// Start a recurring timer bound to `task.cron_expression`.
    ///
    /// The timer captures `task` as it is now; later configuration changes
    /// only take effect through a new timer.
    async fn start_timer(&self, task: Task) -> Result<TimerId>;

    async fn stop_timer(&self, id: TimerId) -> Result<()>;

    /// Stop the backend itself. No timer fires afterwards.
    async fn shutdown(&self) -> Result<()>;
}

/// Cron timers on top of tokio-cron-scheduler.
///
/// Expressions are evaluated in local time. Each firing runs on its own
/// spawned future, so a slow execution never delays other timers.
pub struct CronTimers {
    /// tokio-cron-scheduler instance
    scheduler: JobScheduler,
    runner: Arc<dyn TaskRunner>,
}

impl CronTimers {
    /// Create the scheduler and start it.
    pub async fn start(runner: Arc<dyn TaskRunner>) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;
        scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start scheduler: {}", e))?;

        info!("CronTimers started successfully");
        Ok(Self { scheduler, runner })
    }
}

#[async_trait]
impl TimerBackend for CronTimers {
    async fn start_timer(&self, task: Task) -> Result<TimerId> {
        let cron_expr = normalize_cron(&task.cron_expression)?;
        let runner = self.runner.clone();
        let task_name = task.name.clone();

        debug!(task = %task_name, cron = %cron_expr, "Adding cron timer");

        let job = Job::new_async_tz(cron_expr.as_str(), Local, move |_uuid, _l| {
            let runner = runner.clone();
            let task = task.clone();

            Box::pin(async move {
                info!(task = %task.name, "Cron timer fired");
                runner.run_task(task).await;
            })
        })
        .map_err(|e| anyhow!("Failed to create cron job: {}", e))?;

        let job_uuid = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add job to scheduler: {}", e))?;

        info!(
            task = %task_name,
            job_uuid = %job_uuid,
            cron = %cron_expr,
            "Cron timer added successfully"
        );
        Ok(job_uuid)
    }

    async fn stop_timer(&self, id: TimerId) -> Result<()> {
        self.scheduler
            .remove(&id)
            .await
            .map_err(|e| anyhow!("Failed to remove job from scheduler: {}", e))?;
        debug!(job_uuid = %id, "Cron timer removed");
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to shutdown scheduler: {}", e))?;

        info!("CronTimers shutdown successfully");
        Ok(())
    }
}
