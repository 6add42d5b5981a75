//! Per-type task behaviors.
//!
//! Each behavior reads what it needs from the task, talks to its collaborators
//! sequentially and returns a `TaskReport`. Calls that concern a single
//! device, plugin or entity never abort the loop: their failures become report
//! lines. Failing to fetch a whole data source aborts the behavior.

pub mod battery;
pub mod calendar;
pub mod cameras;
pub mod consumables;
pub mod diagnostics;
pub mod format;
pub mod plugins;
pub mod status;
pub mod unavailable;
pub mod updates;

use crate::models::Task;
use crate::runtime::executor::{Collaborators, ExecutorConfig};

/// Everything a behavior may touch during one execution.
pub struct ActionContext<'a> {
    pub task: &'a Task,
    pub collaborators: &'a Collaborators,
    pub config: &'a ExecutorConfig,
}
