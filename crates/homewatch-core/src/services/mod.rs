pub mod task;

pub use task::{TaskService, TaskServiceError, TaskSummary};
