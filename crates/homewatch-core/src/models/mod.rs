pub mod report;
pub mod task;

pub use report::{DeferredAction, ExecutionOutcome, NotificationOutcome, TaskReport};
pub use task::{
    DEFAULT_BATTERY_THRESHOLD, DEFAULT_CALENDAR_DAYS_IN_FUTURE, DEFAULT_MAX_STATS, TASK_FIELDS, Task,
    TaskType,
};
