//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use leasewise_core::dataset::Dataset;
use leasewise_core::pipeline::{classify, Chain, PipelineRunner, TemplateReasoner};
use leasewise_core::savings::{self, SavingsLedger};
use leasewise_core::tools::ToolRegistry;
use leasewise_services::SearchBridge;
use leasewise_tools::AdvisorState;
use leasewise_types::Config;

const DEFAULT_CONFIG_FILE: &str = "leasewise.toml";

/// Load configuration from the given path, or from `leasewise.toml` in
/// the working directory when present.
pub fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let path = path.map(Path::new).or_else(|| {
        let default = Path::new(DEFAULT_CONFIG_FILE);
        default.is_file().then_some(default)
    });
    Config::load(path).context("failed to load configuration")
}

struct Advisor {
    state: Arc<AdvisorState>,
    bridge: Arc<SearchBridge>,
    registry: Arc<ToolRegistry>,
}

impl std::fmt::Debug for Advisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Advisor").finish_non_exhaustive()
    }
}

fn build_advisor(config: &Config) -> anyhow::Result<Advisor> {
    let dataset = Dataset::load(&config.dataset_path).with_context(|| {
        format!("failed to load dataset '{}'", config.dataset_path.display())
    })?;
    info!(rows = dataset.len(), "dataset loaded");
    let state = Arc::new(AdvisorState::new(
        dataset,
        SavingsLedger::new(config.ledger_path()),
    ));
    let bridge = Arc::new(SearchBridge::new(config.search.clone()));
    let mut registry = ToolRegistry::new();
    leasewise_tools::register_all(&mut registry, state.clone(), bridge.clone());
    Ok(Advisor {
        state,
        bridge,
        registry: Arc::new(registry),
    })
}

/// `lease ask`: classify, build the chain, run it, print the answer.
pub async fn ask(config: &Config, query: &str, trace: bool) -> anyhow::Result<()> {
    let advisor = build_advisor(config)?;
    let intent = classify(query);
    info!(intent = intent.name(), "query classified");

    let chain = Chain::build(intent, query, &advisor.registry, advisor.bridge.is_configured())?;
    let runner = PipelineRunner::new(advisor.registry.clone(), Box::new(TemplateReasoner));
    let report = runner.run(&chain).await?;
    advisor.bridge.stop().await;

    if trace {
        for stage in &report.stages {
            println!("{}", stage.text);
        }
        println!("---");
        println!("tools used: {}", report.tools_used.join(", "));
    } else {
        println!("{}", report.answer);
    }
    Ok(())
}

/// `lease report`: financial summary plus top opportunities.
pub fn report(config: &Config, top: usize) -> anyhow::Result<()> {
    let advisor = build_advisor(config)?;
    let records = advisor.state.ledger.read()?;
    if records.is_empty() {
        println!(
            "The savings ledger is empty. Run `lease ask \"find savings\"` first."
        );
        return Ok(());
    }
    let summary = savings::summarize(&records);
    println!("{}", savings::render_summary(&summary));
    println!("{}", savings::render_top(&savings::top(&records, top)));
    Ok(())
}

/// `lease clear`: delete the ledger.
pub fn clear(config: &Config) -> anyhow::Result<()> {
    let ledger = SavingsLedger::new(config.ledger_path());
    if ledger.clear()? {
        println!("Savings ledger cleared: {}", ledger.path().display());
    } else {
        println!("No savings ledger at {}", ledger.path().display());
    }
    Ok(())
}

/// `lease status`: configuration and dataset diagnostics.
pub async fn status(config: &Config) -> anyhow::Result<()> {
    println!("dataset:  {}", config.dataset_path.display());
    match Dataset::load(&config.dataset_path) {
        Ok(ds) => println!("          {} VMs loaded", ds.len()),
        Err(e) => println!("          unavailable ({e})"),
    }

    let ledger = SavingsLedger::new(config.ledger_path());
    println!("ledger:   {}", ledger.path().display());
    match ledger.read() {
        Ok(records) => println!("          {} recommendations", records.len()),
        Err(e) => println!("          unreadable ({e})"),
    }

    let bridge = SearchBridge::new(config.search.clone());
    println!(
        "search:   {} ({} {})",
        bridge.status().await,
        config.search.command,
        config.search.args.join(" "),
    );
    Ok(())
}
