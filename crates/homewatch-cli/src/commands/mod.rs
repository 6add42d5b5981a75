pub mod run;
pub mod start;
pub mod task;
