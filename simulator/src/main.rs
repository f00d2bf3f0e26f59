//! AMMSim Simulator
//!
//! Drives the swap and add-liquidity forms through scripted or random
//! typing sessions and reports how the linked fields settled.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod metrics;
mod scenario;

use ammsim_common::TokenRegistry;
use ammsim_quote::{MockMarketDataProvider, QuoteContext, QuoteEngine, QuoteEngineConfig, RateTable};
use ammsim_sync::ControllerConfig;
use controller::SessionController;
use scenario::Scenario;

/// Form selection on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Form {
    Swap,
    AddLiquidity,
}

impl From<Form> for QuoteContext {
    fn from(form: Form) -> Self {
        match form {
            Form::Swap => QuoteContext::Swap,
            Form::AddLiquidity => QuoteContext::AddLiquidity,
        }
    }
}

/// AMMSim Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Linked-amount form simulator for AMM swaps and liquidity adds")]
struct Args {
    /// Scenario to run (built-in name or path to a JSON file)
    #[arg(short, long)]
    scenario: Option<String>,

    /// Type this many random keystrokes instead of a scenario
    #[arg(long, default_value = "40")]
    random: usize,

    /// Form driven by random sessions
    #[arg(long, value_enum, default_value = "swap")]
    form: Form,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Session speed multiplier
    #[arg(long, default_value = "1.0")]
    speed: f64,

    /// Override the simulated quote latency in milliseconds
    #[arg(long)]
    latency_ms: Option<u64>,

    /// Token registry JSON file
    #[arg(long)]
    tokens: Option<String>,

    /// Rate table JSON file
    #[arg(long)]
    rates: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// List built-in scenarios and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if args.list {
        for name in Scenario::builtin_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    info!("Starting AMMSim Simulator");
    info!("Speed: {}x", args.speed);

    let engine = Arc::new(build_engine(&args)?);
    info!(
        tokens = engine.registry().len(),
        rates = engine.rates().len(),
        "Quote engine ready"
    );

    let mut config = ControllerConfig::from_env();
    if let Some(ms) = args.latency_ms {
        config.quote_latency = Duration::from_millis(ms);
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let market = Arc::new(MockMarketDataProvider::default());
    let mut session = SessionController::new(engine, config, market, args.speed, args.seed);

    let snapshot = if let Some(scenario_name) = &args.scenario {
        let scenario = Scenario::load(scenario_name)?;
        session.run_scenario(&scenario).await?
    } else {
        session.run_random(args.random, args.form.into()).await?
    };

    info!(
        from_token = ?snapshot.from_token,
        to_token = ?snapshot.to_token,
        amount_from = %snapshot.amount_from,
        amount_to = %snapshot.amount_to,
        readiness = %snapshot.readiness(),
        "Final form"
    );

    // Print metrics
    let metrics = session.metrics();
    info!("Session complete");
    info!("Edits: {}", metrics.edits);
    info!("Swaps: {}", metrics.swaps);
    info!("Selections: {}", metrics.selections);
    info!("Submissions: {}", metrics.submissions);
    info!("Rejected steps: {}", metrics.rejected_steps);
    info!(
        "Quotes issued: {} applied: {} discarded: {} ({:.1}%)",
        metrics.controller.issued,
        metrics.controller.applied,
        metrics.controller.discarded,
        metrics.discard_rate() * 100.0
    );
    info!("Average settle: {}ms", metrics.average_settle_ms());
    info!("P99 settle: {}ms", metrics.p99_settle_ms());

    Ok(())
}

/// Build the quote engine from files and environment.
fn build_engine(args: &Args) -> anyhow::Result<QuoteEngine> {
    let registry = match &args.tokens {
        Some(path) => TokenRegistry::from_json(&std::fs::read_to_string(path)?)?,
        None => TokenRegistry::mock(),
    };
    let rates = match &args.rates {
        Some(path) => RateTable::from_json(&std::fs::read_to_string(path)?)?,
        None => RateTable::mock(),
    };

    let config = QuoteEngineConfig::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    Ok(QuoteEngine::new(Arc::new(registry), rates, config))
}
