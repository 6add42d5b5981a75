use anyhow::Result;
use homewatch_core::NotificationOutcome;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::executor::CommandExecutor;
use crate::output::{OutputFormat, print_json};

pub async fn run(executor: Arc<dyn CommandExecutor>, args: RunArgs, format: OutputFormat) -> Result<()> {
    let outcome = executor.run_task(&args.task).await?;

    if format.is_json() {
        return print_json(&outcome);
    }

    if !outcome.report.message.is_empty() {
        println!("{}", outcome.report.message);
        println!();
    }

    let notification = match &outcome.notification {
        NotificationOutcome::Skipped => "skipped (skipNotify)".to_string(),
        NotificationOutcome::Suppressed => "suppressed (nothing to report)".to_string(),
        NotificationOutcome::NoTarget => "not sent (no notifier configured)".to_string(),
        NotificationOutcome::Sent { delivered, failed } if failed.is_empty() => {
            format!("sent to {}", delivered.join(", "))
        }
        NotificationOutcome::Sent { delivered, failed } => format!(
            "sent to [{}], failed for [{}]",
            delivered.join(", "),
            failed.join(", ")
        ),
    };
    println!("Notification: {}", notification);

    if let Some(action) = outcome.deferred_ran {
        println!("Deferred action: {:?}", action);
    }
    Ok(())
}
