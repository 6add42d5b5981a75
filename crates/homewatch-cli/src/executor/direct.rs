use anyhow::Result;
use async_trait::async_trait;
use homewatch_core::services::TaskSummary;
use homewatch_core::{ExecutionOutcome, HomewatchCore};
use std::sync::Arc;

use crate::config::CliConfig;
use crate::executor::CommandExecutor;
use crate::setup;

pub struct DirectExecutor {
    core: Arc<HomewatchCore>,
}

impl DirectExecutor {
    pub fn connect(db_path: Option<String>, config: &CliConfig) -> Result<Self> {
        Ok(Self {
            core: setup::prepare_core(db_path, config)?,
        })
    }
}

#[async_trait]
impl CommandExecutor for DirectExecutor {
    async fn list_tasks(&self) -> Result<Vec<TaskSummary>> {
        self.core.tasks.list_tasks()
    }

    async fn set_task_field(&self, name: &str, field: &str, value: &str) -> Result<()> {
        self.core.tasks.set_field(name, field, value)
    }

    async fn remove_task(&self, name: &str) -> Result<()> {
        self.core.tasks.remove_task(name)
    }

    async fn run_task(&self, name: &str) -> Result<ExecutionOutcome> {
        self.core.tasks.run_task_now(name).await
    }
}
