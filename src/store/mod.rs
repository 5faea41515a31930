//! On-disk run layout.
//!
//! Each run lives in its own directory named after its UTC start time:
//!
//! ```text
//! runs/20240611-093012/
//!     meta.json       write-once, appears when the run finishes
//!     results.jsonl   one record per line, append-only
//!     report.md
//! ```
//!
//! Readers and the writer never share memory. A run without `meta.json` is
//! still in progress (or was killed) and is invisible to discovery, and
//! readers only consume newline-terminated lines of `results.jsonl`.

pub(crate) mod lenient;
mod layout;
mod meta;
mod reader;
mod writer;

pub use layout::{is_valid_run_id, run_dir_name, META_FILE, REPORT_FILE, RESULTS_FILE};
pub use meta::{RunMetadata, RunStatus};
pub use reader::{discover_runs, read_metadata, read_records, DiscoveredRun};
pub use writer::RunWriter;
