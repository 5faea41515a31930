use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use llm_evals::aggregate::summarize;
use llm_evals::api::{self, ServerState};
use llm_evals::backend::{backend_for, ModelRef, DEFAULT_PROVIDER};
use llm_evals::dashboard::RunRepository;
use llm_evals::executor::{RunExecutor, RunOptions};
use llm_evals::policy::Policy;
use llm_evals::prompt::load_prompts;
use llm_evals::report::{load_and_write_report, write_report};
use llm_evals::store::{read_records, run_dir_name, RunStatus};

const PROVIDERS: &[&str] = &[DEFAULT_PROVIDER];

pub async fn providers(base_url: Option<&str>) -> anyhow::Result<()> {
    for name in PROVIDERS {
        let backend = backend_for(name, base_url)?;
        if backend.is_available().await {
            let models = backend.list_models().await;
            let models = if models.is_empty() {
                "none installed".to_string()
            } else {
                models.join(", ")
            };
            println!("{name:<10} available    {models}");
        } else {
            println!("{name:<10} unavailable  service not running (start it with `ollama serve`)");
        }
    }
    Ok(())
}

pub async fn check(
    base_url: Option<&str>,
    model: Option<&str>,
    prompts: Option<&Path>,
    policy: Option<&Path>,
) -> anyhow::Result<()> {
    let mut failures = 0;

    if let Some(path) = policy {
        match Policy::load(path) {
            Ok(_) => println!("ok    policy {}", path.display()),
            Err(err) => {
                failures += 1;
                println!("FAIL  {err}");
            }
        }
    }
    if let Some(path) = prompts {
        match load_prompts(path) {
            Ok(set) => println!("ok    {} prompts in {}", set.len(), path.display()),
            Err(err) => {
                failures += 1;
                println!("FAIL  {err}");
            }
        }
    }

    let model_ref = model.map(ModelRef::parse);
    let provider = model_ref
        .as_ref()
        .map_or(DEFAULT_PROVIDER, |m| m.provider.as_str());
    let backend = backend_for(provider, base_url)?;
    if backend.is_available().await {
        println!("ok    {provider} service");
        let models = backend.list_models().await;
        if models.is_empty() {
            println!("warn  no models installed (ollama pull <model>)");
        } else {
            println!("ok    models: {}", models.join(", "));
        }
        if let Some(model_ref) = &model_ref {
            if backend.model_exists(&model_ref.model).await {
                println!("ok    model '{}' is available", model_ref.model);
            } else {
                failures += 1;
                println!(
                    "FAIL  model '{}' not found (ollama pull {})",
                    model_ref.model, model_ref.model
                );
            }
        }
    } else {
        failures += 1;
        println!("FAIL  {provider} service not available (ollama serve)");
    }

    if failures > 0 {
        bail!("{failures} check(s) failed");
    }
    Ok(())
}

pub struct RunRequest {
    pub model: String,
    pub prompts: PathBuf,
    pub policy: PathBuf,
    pub out: Option<PathBuf>,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

pub async fn run_evaluation(
    request: RunRequest,
    base_url: Option<&str>,
    runs_dir: &Path,
) -> anyhow::Result<()> {
    let model_ref = ModelRef::parse(&request.model);
    let backend = backend_for(&model_ref.provider, base_url).with_context(|| {
        format!(
            "cannot evaluate '{}': use {DEFAULT_PROVIDER}/<model> or just <model>",
            request.model
        )
    })?;

    let policy = Policy::load(&request.policy)?;
    let prompts = load_prompts(&request.prompts)?;
    let out = request
        .out
        .unwrap_or_else(|| runs_dir.join(run_dir_name(Utc::now())));
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }

    println!("model   {model_ref}");
    println!("prompts {} ({})", request.prompts.display(), prompts.len());
    println!("policy  {}", request.policy.display());
    println!("output  {}", out.display());

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, finishing current run");
            ctrl_c.cancel();
        }
    });

    let options = RunOptions::default()
        .temperature(request.temperature)
        .timeout(Duration::from_secs(request.timeout_secs))
        .extra("prompts_file", request.prompts.display().to_string())
        .extra("policy_file", request.policy.display().to_string());
    let metadata = RunExecutor::new(backend)
        .cancellation(token)
        .run(&request.model, &prompts, &policy, &out, &options)
        .await?;

    let records = read_records(&out)?;
    let report = write_report(&out, &metadata, &records)?;
    let summary = summarize(&records);

    println!();
    println!("evaluated {} / {}", summary.total_prompts, metadata.total_prompts);
    if let Some(rate) = summary.accuracy_rate {
        println!("accuracy  {:.1}%", rate * 100.0);
    }
    if let Some(ms) = summary.avg_latency_ms {
        println!("latency   {ms:.0} ms avg");
    }
    println!("blocked   {}", summary.blocked_count);
    if summary.error_count > 0 {
        println!("errors    {}", summary.error_count);
    }
    println!("report    {}", report.display());

    if metadata.status == RunStatus::Cancelled {
        bail!(
            "run cancelled after {} of {} prompts",
            summary.total_prompts,
            metadata.total_prompts
        );
    }
    Ok(())
}

pub fn report(dir: &Path) -> anyhow::Result<()> {
    if !dir.is_dir() {
        bail!("{} is not a run directory", dir.display());
    }
    let path = load_and_write_report(dir)?;
    println!("report generated: {}", path.display());
    Ok(())
}

pub async fn dashboard(host: &str, port: u16, runs_dir: PathBuf) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid dashboard address {host}:{port}"))?;
    let state = ServerState::new(RunRepository::new(runs_dir));
    api::serve(addr, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}
