#[path = "llm-evals/app/mod.rs"]
mod app;
#[path = "llm-evals/args.rs"]
mod args;
#[path = "llm-evals/config/mod.rs"]
mod config;
#[path = "llm-evals/logging.rs"]
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
