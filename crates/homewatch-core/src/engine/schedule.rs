//! Cron expression handling.
//!
//! Tasks are configured with standard 5-field expressions; the scheduler
//! expects the 6-field format with a leading seconds column.

use anyhow::{Result, anyhow};
use chrono::{DateTime, TimeZone};
use cron::Schedule;
use std::str::FromStr;

/// Normalize and validate a cron expression.
///
/// 5-field expressions get a `0` seconds column prepended; 6- and 7-field
/// expressions are passed through.
pub fn normalize_cron(expression: &str) -> Result<String> {
    let trimmed = expression.trim();
    let normalized = match trimmed.split_whitespace().count() {
        5 => format!("0 {}", trimmed),
        6 | 7 => trimmed.split_whitespace().collect::<Vec<_>>().join(" "),
        0 => return Err(anyhow!("Empty cron expression")),
        n => {
            return Err(anyhow!(
                "Invalid cron expression '{}': expected 5 to 7 fields, got {}",
                trimmed,
                n
            ));
        }
    };

    Schedule::from_str(&normalized)
        .map_err(|e| anyhow!("Invalid cron expression '{}': {}", trimmed, e))?;
    Ok(normalized)
}

/// Next fire time strictly after `after`, or `None` for invalid expressions.
pub fn next_run<Tz: TimeZone>(expression: &str, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let normalized = normalize_cron(expression).ok()?;
    let schedule = Schedule::from_str(&normalized).ok()?;
    schedule.after(after).next()
}
