pub mod clients;
pub mod daemon;
pub mod engine;
pub mod models;
pub mod paths;
pub mod runtime;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod testkit;

pub use models::*;

use anyhow::Result;
use homewatch_storage::Storage;
use homewatch_traits::ConfigStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use engine::{CronTimers, ReconcilerHandle, TaskReconciler};
use runtime::{Collaborators, ExecutorConfig, TaskExecutor};
use services::TaskService;

/// Core application state shared by the daemon and one-shot commands.
pub struct HomewatchCore {
    pub store: Arc<dyn ConfigStore>,
    pub executor: Arc<TaskExecutor>,
    pub tasks: TaskService,
}

impl HomewatchCore {
    /// Open the redb-backed configuration store at `db_path`.
    pub fn open(
        db_path: impl AsRef<Path>,
        collaborators: Collaborators,
        config: ExecutorConfig,
    ) -> Result<Self> {
        let storage = Storage::new(db_path.as_ref())?;
        info!(path = %db_path.as_ref().display(), "Initializing Homewatch");
        Ok(Self::with_store(
            Arc::new(storage.config),
            collaborators,
            config,
        ))
    }

    pub fn with_store(
        store: Arc<dyn ConfigStore>,
        collaborators: Collaborators,
        config: ExecutorConfig,
    ) -> Self {
        let executor = Arc::new(TaskExecutor::new(store.clone(), collaborators, config));
        let tasks = TaskService::new(store.clone(), executor.clone());
        Self {
            store,
            executor,
            tasks,
        }
    }

    /// Start the cron timers and the reconciler loop.
    pub async fn start_scheduler(&self, poll_interval: Duration) -> Result<ReconcilerHandle> {
        let timers = Arc::new(CronTimers::start(self.executor.clone()).await?);
        let reconciler = Arc::new(TaskReconciler::new(self.store.clone(), timers));
        Ok(reconciler.start(poll_interval))
    }
}
