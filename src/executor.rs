//! Sequential execution of a prompt set against one model.

#[path = "executor/options.rs"]
mod options;

#[path = "executor/runner.rs"]
mod runner;


pub use options::RunOptions;
pub use runner::RunExecutor;
