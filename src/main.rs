//! Circuit breaker demo CLI.
//!
//! ```text
//! breaker-demo check breakers.toml
//! breaker-demo simulate --name payments --fail-for-secs 3 --calls 20
//! ```

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::time::Instant;

use circuit_breaker::config::{load_config, BreakerSettings, StrategyConfig};
use circuit_breaker::observability::{logging, metrics};
use circuit_breaker::{BreakerError, BreakerRegistry, Strategy};

#[derive(Parser)]
#[command(name = "breaker-demo")]
#[command(about = "Exercise circuit breakers against a simulated dependency", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and print the effective strategies
    Check {
        config: PathBuf,
    },
    /// Drive a dependency that fails for a while, then recovers
    Simulate {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, default_value = "demo")]
        name: String,

        /// Seconds the dependency keeps failing
        #[arg(long, default_value_t = 3)]
        fail_for_secs: u64,

        #[arg(long, default_value_t = 20)]
        calls: u32,

        #[arg(long, default_value_t = 500)]
        call_interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let settings = load_config(&config)?;
            print_strategies(&settings)?;
        }
        Commands::Simulate {
            config,
            name,
            fail_for_secs,
            calls,
            call_interval_ms,
        } => {
            let settings = match config {
                Some(path) => load_config(&path)?,
                None => BreakerSettings::default(),
            };
            simulate(
                settings,
                &name,
                Duration::from_secs(fail_for_secs),
                calls,
                Duration::from_millis(call_interval_ms),
            )
            .await;
        }
    }

    Ok(())
}

fn print_strategies(settings: &BreakerSettings) -> Result<(), serde_json::Error> {
    let breakers: Vec<_> = settings
        .breakers
        .iter()
        .map(|b| {
            let effective = StrategyConfig::from(&settings.strategy_for(&b.name));
            json!({ "name": b.name, "strategy": effective })
        })
        .collect();

    let report = json!({
        "defaults": StrategyConfig::from(&Strategy::from(settings.defaults.clone())),
        "breakers": breakers,
        "observability": settings.observability,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn simulate(
    settings: BreakerSettings,
    name: &str,
    fail_for: Duration,
    calls: u32,
    call_interval: Duration,
) {
    logging::init_logging(&settings.observability);

    if settings.observability.metrics_enabled {
        if let Ok(addr) = settings.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let registry = BreakerRegistry::from_config(settings);
    let breaker = registry.get_or_create(name);
    let started = Instant::now();

    tracing::info!(
        breaker = %name,
        fail_for_secs = fail_for.as_secs(),
        calls,
        "Simulation starting"
    );

    for call in 1..=calls {
        let result = breaker
            .execute(move || async move {
                if started.elapsed() < fail_for {
                    Err(io::Error::other("dependency unavailable"))
                } else {
                    Ok("ok")
                }
            })
            .await;

        let outcome = match result {
            Ok(value) => format!("success: {}", value),
            Err(BreakerError::Operation(e)) => format!("operation failed: {}", e),
            Err(e) => format!("rejected: {}", e),
        };
        println!(
            "[{:>5.1}s] call {:>3}: {:<45} state={}",
            started.elapsed().as_secs_f64(),
            call,
            outcome,
            breaker.state()
        );

        tokio::time::sleep(call_interval).await;
    }
}
