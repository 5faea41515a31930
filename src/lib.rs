//! Evaluation and policy enforcement for LLM responses.
//!
//! A run sends every prompt of a prompt set to a generation backend, judges
//! each response against a [`Policy`](policy::Policy) (latency, accuracy,
//! toxicity, PII) and appends the resulting records to a run directory.
//! Summaries are recomputed from those files on demand, by the dashboard
//! read API or the report writer.
//!
//! ```no_run
//! use llm_evals::{
//!     backend::backend_for, executor::{RunExecutor, RunOptions}, policy::Policy,
//!     prompt::load_prompts,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = backend_for("ollama", None)?;
//! let prompts = load_prompts("prompts.jsonl")?;
//! let policy = Policy::load("policy.json")?;
//! let meta = RunExecutor::new(backend)
//!     .run("ollama/llama3", &prompts, &policy, "runs/20240101-000000".as_ref(), &RunOptions::default())
//!     .await?;
//! println!("{} prompts evaluated", meta.total_prompts);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod backend;
pub mod dashboard;
pub mod detect;
pub mod error;
pub mod executor;
pub mod policy;
pub mod prompt;
pub mod record;
pub mod report;
pub mod store;
pub mod verdict;

#[cfg(feature = "api")]
pub mod api;

pub use error::{BackendError, ConfigError, DashboardError, EvalError, PersistenceError};
pub use executor::{RunExecutor, RunOptions};
pub use policy::Policy;
pub use prompt::Prompt;
pub use record::EvaluationRecord;
