//! Key layout of the Configuration Store.

/// JSON array of configured task names.
pub const TASK_LIST_KEY: &str = "tasks";

/// Notifier used when a task has no additional notifiers.
pub const DEFAULT_NOTIFIER_KEY: &str = "defaultNotifier";

/// `task:<name>:<field>`
pub fn task_key(name: &str, field: &str) -> String {
    format!("task:{}:{}", name, field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_key() {
        assert_eq!(task_key("Nightly", "cronExpression"), "task:Nightly:cronExpression");
        assert_eq!(task_key("cam:porch", "type"), "task:cam:porch:type");
    }
}
