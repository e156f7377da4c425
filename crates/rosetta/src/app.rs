//! Application entry point and dispatch.

use std::io::{IsTerminal, Read};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use rosetta_cli::output::{write_to_file, RunReport};
use rosetta_cli::presenter::{CliResultPresenter, CliStoreObserver};
use rosetta_cli::ui::{print_success, print_warning};
use rosetta_core::{
    CancellationToken, DocsDirectoryProviderSource, OptimizationAgent, ProviderSource,
    SimulatedAgent, StaticProviderSource, Toggle,
};
use rosetta_orchestration::interfaces::ResultPresenter;
use rosetta_orchestration::OrchestrationStore;

use crate::config::AppConfig;
use crate::errors::AppError;

/// How often the run loop checks for Ctrl+C.
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    // Handle shell completion
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        rosetta_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(());
    }

    let mut store = build_store(config)?;
    store.fetch_providers().map_err(AppError::from)?;

    if config.list_providers {
        for provider in store.available_providers() {
            println!("{provider}");
        }
        return Ok(());
    }

    store.set_prompt(read_prompt(config)?);
    select_providers(&mut store, config)?;
    run_optimization(&mut store, config)
}

/// Wire the store to the configured provider source and simulated agent.
pub fn build_store(config: &AppConfig) -> Result<OrchestrationStore> {
    let source: Arc<dyn ProviderSource> = if let Some(dir) = &config.docs_dir {
        Arc::new(DocsDirectoryProviderSource::new(dir))
    } else if !config.providers.is_empty() {
        Arc::new(StaticProviderSource::new(config.providers.iter().map(String::as_str)))
    } else {
        Arc::new(StaticProviderSource::default())
    };

    let mut agent = SimulatedAgent::new(config.latency_duration()?);
    for (provider, latency) in config.latency_overrides()? {
        agent = agent.with_latency_for(provider, latency);
    }
    for (provider, message) in config.failures()? {
        agent = agent.with_failure(provider, message);
    }
    let agent: Arc<dyn OptimizationAgent> = Arc::new(agent);

    Ok(OrchestrationStore::new(source, agent).with_options(config.optimize_options()?))
}

/// Prompt from the positional argument, `--prompt-file` or piped stdin.
pub fn read_prompt(config: &AppConfig) -> Result<String> {
    if let Some(prompt) = &config.prompt {
        return Ok(prompt.clone());
    }
    if let Some(path) = &config.prompt_file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read prompt file {}", path.display()));
    }
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(AppError::Config(
            "no prompt given (pass it as an argument, --prompt-file or stdin)".into(),
        )
        .into());
    }
    let mut prompt = String::new();
    stdin
        .lock()
        .read_to_string(&mut prompt)
        .context("failed to read prompt from stdin")?;
    Ok(prompt)
}

/// Apply `--select` / `--all` to the store. No selection means all.
pub fn select_providers(store: &mut OrchestrationStore, config: &AppConfig) -> Result<()> {
    if config.all || config.select.is_empty() {
        for provider in store.available_providers().to_vec() {
            store.toggle_provider(provider);
        }
        return Ok(());
    }

    for id in &config.select {
        let id = id.trim();
        if store.selected_providers().iter().any(|p| p.as_str() == id) {
            continue;
        }
        if store.toggle_provider(id) == Toggle::Ignored {
            let available: Vec<&str> = store
                .available_providers()
                .iter()
                .map(|p| p.as_str())
                .collect();
            return Err(AppError::Config(format!(
                "unknown provider '{id}' (available: {})",
                available.join(", ")
            ))
            .into());
        }
    }
    Ok(())
}

fn run_optimization(store: &mut OrchestrationStore, config: &AppConfig) -> Result<()> {
    store.subscribe(Arc::new(CliStoreObserver::new(!config.quiet, !config.quiet)));

    let interrupt = CancellationToken::new();
    install_interrupt_handler(interrupt.clone());

    let ticket = store.optimize_prompt().map_err(AppError::from)?;
    debug!(run_id = ticket.run_id, providers = ticket.providers.len(), "run dispatched");

    loop {
        if store.wait_for_results(INTERRUPT_POLL) {
            break;
        }
        if interrupt.is_cancelled() {
            store.reset();
            return Err(AppError::Interrupted.into());
        }
        if !store.is_running() {
            anyhow::bail!("optimization run ended without results");
        }
    }

    let results = store
        .results()
        .cloned()
        .context("optimization run ended without results")?;
    let presenter = CliResultPresenter::new(config.quiet);

    if config.json {
        println!("{}", RunReport::new(&results).with_logs(store.logs()).to_json()?);
    } else {
        presenter.present_results(&results);
    }

    if let Some(path) = &config.output {
        let json = RunReport::new(&results).with_logs(store.logs()).to_json()?;
        write_to_file(path, &json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        if !config.quiet && !config.json {
            print_success(&format!("Report written to {}", path.display()));
        }
    }

    if let Some(show) = &config.show {
        if store.select_card(show.as_str()) {
            if let Some(result) = store.popup_result() {
                presenter.present_detail(results.original(), result);
            }
            store.close_popup();
        } else {
            print_warning(&format!("no result for provider '{show}'"));
        }
    }

    if results.all_failed() {
        return Err(AppError::AllFailed.into());
    }
    Ok(())
}

fn install_interrupt_handler(interrupt: CancellationToken) {
    if let Err(e) = ctrlc::set_handler(move || interrupt.cancel()) {
        warn!(error = %e, "could not install Ctrl+C handler");
    }
}
