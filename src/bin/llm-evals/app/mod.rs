mod commands;

use clap::Parser;

use crate::args::{CliArgs, Command};
use crate::config::load_config;
use crate::logging::init_logging;

pub async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let loaded = load_config(args.config.clone())?;
    let _logger = init_logging(&loaded.config.logging, &loaded.paths)?;

    let config = loaded.config;
    let base_url = args.base_url.clone().or(config.backend.base_url.clone());

    match args.command {
        Command::Providers => commands::providers(base_url.as_deref()).await,
        Command::Check {
            model,
            prompts,
            policy,
        } => {
            commands::check(
                base_url.as_deref(),
                model.as_deref(),
                prompts.as_deref(),
                policy.as_deref(),
            )
            .await
        }
        Command::Run {
            model,
            prompts,
            policy,
            out,
            temp,
            timeout,
        } => {
            let request = commands::RunRequest {
                model,
                prompts,
                policy,
                out,
                temperature: temp,
                timeout_secs: timeout.unwrap_or(config.backend.timeout_secs),
            };
            commands::run_evaluation(request, base_url.as_deref(), &config.runs.dir).await
        }
        Command::Report { dir } => commands::report(&dir),
        Command::Dashboard {
            port,
            host,
            runs_dir,
        } => {
            let host = host.unwrap_or(config.dashboard.host);
            let port = port.unwrap_or(config.dashboard.port);
            let runs_dir = runs_dir.unwrap_or(config.runs.dir);
            commands::dashboard(&host, port, runs_dir).await
        }
    }
}
