#[path = "handlers/runs.rs"]
mod runs;

#[path = "handlers/stats.rs"]
mod stats;

#[path = "handlers/helpers.rs"]
mod helpers;

pub use helpers::ApiResult;
pub use runs::{handle_list_runs, handle_run_detail, RunsQuery};
pub use stats::handle_stats;
