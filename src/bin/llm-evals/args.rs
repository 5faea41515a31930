use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "llm-evals",
    version,
    about = "Evaluate local LLMs against latency, accuracy, toxicity and PII policies"
)]
pub struct CliArgs {
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,
    /// Override the backend base URL from the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List providers and the models they serve
    Providers,
    /// Check that the backend and an optional model are reachable
    Check {
        #[arg(long, short = 'm')]
        model: Option<String>,
        /// Also validate this prompt set
        #[arg(long)]
        prompts: Option<PathBuf>,
        /// Also validate this policy file
        #[arg(long)]
        policy: Option<PathBuf>,
    },
    /// Evaluate a prompt set against a model
    Run {
        /// Model to evaluate, e.g. `ollama/llama3` or `llama3`
        #[arg(long, short = 'm')]
        model: String,
        #[arg(long, default_value = "prompts.csv")]
        prompts: PathBuf,
        #[arg(long, default_value = "policy.json")]
        policy: PathBuf,
        /// Run directory; defaults to `<runs dir>/<UTC timestamp>`
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        temp: Option<f32>,
        /// Per-prompt timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Regenerate `report.md` for an existing run
    Report { dir: PathBuf },
    /// Serve the dashboard read API
    Dashboard {
        #[arg(long, short = 'p')]
        port: Option<u16>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        runs_dir: Option<PathBuf>,
    },
}
