use anyhow::Result;
use async_trait::async_trait;
use homewatch_core::ExecutionOutcome;
use homewatch_core::daemon::IpcClient;
use homewatch_core::services::TaskSummary;
use std::path::Path;
use tokio::sync::Mutex;

use crate::executor::CommandExecutor;

pub struct IpcExecutor {
    client: Mutex<IpcClient>,
}

impl IpcExecutor {
    pub async fn connect(socket_path: &Path) -> Result<Self> {
        let client = IpcClient::connect(socket_path).await?;
        Ok(Self {
            client: Mutex::new(client),
        })
    }
}

#[async_trait]
impl CommandExecutor for IpcExecutor {
    async fn list_tasks(&self) -> Result<Vec<TaskSummary>> {
        self.client.lock().await.list_tasks().await
    }

    async fn set_task_field(&self, name: &str, field: &str, value: &str) -> Result<()> {
        self.client.lock().await.set_task_field(name, field, value).await
    }

    async fn remove_task(&self, name: &str) -> Result<()> {
        self.client.lock().await.remove_task(name).await
    }

    async fn run_task(&self, name: &str) -> Result<ExecutionOutcome> {
        self.client.lock().await.run_task(name).await
    }
}
