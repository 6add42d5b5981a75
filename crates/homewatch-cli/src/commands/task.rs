use anyhow::Result;
use comfy_table::{Cell, Table};
use homewatch_core::services::TaskSummary;
use std::sync::Arc;

use crate::cli::TaskCommands;
use crate::executor::CommandExecutor;
use crate::output::{OutputFormat, print_json, print_table};

pub async fn run(
    executor: Arc<dyn CommandExecutor>,
    command: TaskCommands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        TaskCommands::List => list_tasks(executor.as_ref(), format).await,
        TaskCommands::Set { name, field, value } => {
            executor.set_task_field(&name, &field, &value).await?;
            println!("Set {} for task '{}'", field, name);
            Ok(())
        }
        TaskCommands::Remove { name } => {
            executor.remove_task(&name).await?;
            println!("Removed task '{}'", name);
            Ok(())
        }
    }
}

fn build_table(tasks: &[TaskSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Name", "Type", "Cron", "Enabled", "Next run"]);

    for summary in tasks {
        let task = &summary.task;
        let task_type = task
            .task_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "(invalid)".to_string());
        let cron = if task.has_schedule() {
            task.cron_expression.as_str()
        } else {
            "-"
        };
        let next_run = summary
            .next_run
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&task.name),
            Cell::new(task_type),
            Cell::new(cron),
            Cell::new(if task.enabled { "yes" } else { "no" }),
            Cell::new(next_run),
        ]);
    }
    table
}

async fn list_tasks(executor: &dyn CommandExecutor, format: OutputFormat) -> Result<()> {
    let tasks = executor.list_tasks().await?;

    if format.is_json() {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("No tasks configured");
        return Ok(());
    }

    print_table(&build_table(&tasks));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use homewatch_core::{Task, TaskType};

    #[test]
    fn test_table_rows() {
        let tasks = vec![
            TaskSummary {
                task: Task::new("Nightly")
                    .with_type(TaskType::RestartCameras)
                    .with_cron("0 3 * * *")
                    .enabled(),
                next_run: None,
            },
            TaskSummary {
                task: Task::new("Broken"),
                next_run: None,
            },
        ];

        let rendered = build_table(&tasks).to_string();
        assert!(rendered.contains("RestartCameras"));
        assert!(rendered.contains("0 3 * * *"));
        assert!(rendered.contains("(invalid)"));
    }
}
