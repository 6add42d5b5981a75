pub mod actions;
pub mod executor;

pub use actions::ActionContext;
pub use executor::{Collaborators, ExecutorConfig, TaskExecutor};
