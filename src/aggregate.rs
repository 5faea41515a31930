//! Run and fleet statistics, recomputed from persisted records on every read.
//!
//! Both entry points are total: empty, partial or odd input produces a
//! summary, never an error.

#[path = "aggregate/summary.rs"]
mod summary;

#[path = "aggregate/fleet.rs"]
mod fleet;

pub use fleet::{aggregate, FleetStats, RunOverview, RunViolation, RECENT_VIOLATION_WINDOW};
pub use summary::{summarize, RunSummary};

/// Mean of the values present; `None` when there are none.
fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
