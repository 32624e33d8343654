//! agrosim-run - executes an agromanagement definition day by day
//!
//! Loads a JSON agromanagement definition, wires the sequencer, the signal
//! bus and the built-in process models into the engine, and runs the
//! simulation to its resolved end date (or until terminate).

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agrosim_engine::{CanopyGrowth, Engine, SiteWaterBucket};
use agrosim_foundation::SignalBus;
use agrosim_manager::{AgroManagementSpec, AgroManager, AgroManagerSingleYear, Sequencer, SingleYearSpec};

#[derive(Parser, Debug)]
#[command(name = "agrosim-run")]
#[command(about = "Run an agromanagement definition through the daily engine")]
struct Cli {
    /// Path to an agromanagement definition (JSON)
    definition: PathBuf,

    /// Treat the definition as a flat single-year site + crop block
    #[arg(long)]
    single_year: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.definition)
        .with_context(|| format!("reading {}", cli.definition.display()))?;

    let mut bus = SignalBus::new();
    let sequencer: Box<dyn Sequencer> = if cli.single_year {
        let spec = SingleYearSpec::from_json_str(&text)?;
        Box::new(AgroManagerSingleYear::new(&spec, &mut bus)?)
    } else {
        let spec = AgroManagementSpec::from_json_str(&text)?;
        Box::new(AgroManager::new(&spec, &mut bus)?)
    };

    let mut engine = Engine::new(sequencer, bus)?;
    engine.add_model(Box::new(SiteWaterBucket::new()));
    engine.add_model(Box::new(CanopyGrowth::new()));

    let days = engine.run()?;

    info!(
        days,
        last_day = %engine.current_day(),
        terminated = engine.terminated(),
        "simulation finished"
    );
    Ok(())
}
