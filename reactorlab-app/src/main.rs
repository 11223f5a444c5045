use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod plotting;
mod workflow;

#[derive(Parser, Debug)]
#[command(name = "reactorlab")]
#[command(about = "Simulated enzyme-reactor fleet with alerts, predictions and optimization")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Drive the fleet in real time on the configured refresh interval until Ctrl-C
    Run {
        #[command(flatten)]
        common: CommonArgs,
        /// Stop after this many refreshes
        #[arg(long)]
        refreshes: Option<u64>,
    },
    /// Advance the fleet as fast as possible for a fixed number of refreshes
    Simulate {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value = "150")]
        refreshes: u64,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// YAML fleet file; the built-in four-reactor demo fleet is used when omitted
    #[arg(long)]
    fleet: Option<PathBuf>,

    /// Directory for the CSV log, JSON snapshot and charts
    /// (default: ./data/runs/<timestamp>)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the fleet-level seed from the fleet file
    #[arg(long)]
    seed: Option<u64>,

    /// Skip chart rendering
    #[arg(long)]
    no_plots: bool,
}

impl CommonArgs {
    fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            PathBuf::from(format!("./data/runs/reactorlab_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")))
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    println!("--- Reactorlab ---");

    let (common, refreshes) = match &cli.command {
        Mode::Run { common, refreshes } => (common, *refreshes),
        Mode::Simulate { common, refreshes } => (common, Some(*refreshes)),
    };

    let mut fleet_file = match &common.fleet {
        Some(path) => config::load_fleet_file(path)?,
        None => {
            println!("No fleet file given; using the built-in demo fleet.");
            config::demo_fleet()
        }
    };
    if let Some(seed) = common.seed {
        fleet_file.simulation.seed = seed;
    }

    let output_dir = common.output_dir();
    let mut driver = workflow::Driver::new(&fleet_file, chrono::Utc::now(), &output_dir)?;

    match cli.command {
        Mode::Run { .. } => {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            runtime.block_on(workflow::run_realtime(&mut driver, refreshes))?;
        }
        Mode::Simulate { .. } => workflow::run_headless(&mut driver, refreshes.unwrap_or_default())?,
    }

    driver.finish(!common.no_plots)?;
    println!("\nRun complete. Results are in '{}'", output_dir.display());
    Ok(())
}
