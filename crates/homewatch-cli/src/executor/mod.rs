use anyhow::Result;
use async_trait::async_trait;
use homewatch_core::daemon::is_daemon_available;
use homewatch_core::paths;
use homewatch_core::services::TaskSummary;
use homewatch_core::ExecutionOutcome;
use std::sync::Arc;

use crate::config::CliConfig;

pub mod direct;
#[cfg(unix)]
pub mod ipc;

/// Task administration, either against the database or a running daemon.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<TaskSummary>>;
    async fn set_task_field(&self, name: &str, field: &str, value: &str) -> Result<()>;
    async fn remove_task(&self, name: &str) -> Result<()>;
    async fn run_task(&self, name: &str) -> Result<ExecutionOutcome>;
}

/// Talk to the daemon when one owns the database, otherwise open it directly.
pub async fn create(db_path: Option<String>, config: &CliConfig) -> Result<Arc<dyn CommandExecutor>> {
    let socket_path = paths::socket_path()?;
    if is_daemon_available(&socket_path).await {
        #[cfg(unix)]
        {
            let executor = ipc::IpcExecutor::connect(&socket_path).await?;
            return Ok(Arc::new(executor));
        }
    }
    let executor = direct::DirectExecutor::connect(db_path, config)?;
    Ok(Arc::new(executor))
}
