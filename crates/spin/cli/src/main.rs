//! spinctl - SPIN token and crowdsale operator tool
//!
//! Deploys the token and its crowdsale in memory from a configuration file,
//! replays an operation script against them and prints a JSON report of the
//! resulting balances, sale state and emitted events.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use spin_cli::{DeploymentConfig, Runner, Script};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// spinctl CLI
#[derive(Parser)]
#[command(name = "spinctl")]
#[command(about = "Replay SPIN token and crowdsale operation scripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Operation script (JSON)
    script: PathBuf,

    /// Configuration file path
    #[arg(short, long, env = "SPIN_CONFIG")]
    config: Option<String>,

    /// Log level, overriding the configuration file
    #[arg(long, env = "SPIN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "SPIN_LOG_JSON")]
    json: bool,

    /// Keep going after a failed step
    #[arg(long)]
    continue_on_error: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = DeploymentConfig::load(cli.config.as_deref()).context("loading configuration")?;

    // Initialize tracing; stdout is reserved for the report
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());

    if cli.json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let mut script = Script::from_path(&cli.script)
        .with_context(|| format!("loading script {}", cli.script.display()))?;
    script.continue_on_error |= cli.continue_on_error;

    info!(
        script = %cli.script.display(),
        steps = script.steps.len(),
        "Replaying script"
    );

    let mut runner = Runner::new(&config);
    let report = runner.run(&script).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(failed) = report.failed() {
        anyhow::bail!(
            "step {} ({}) failed: {}",
            failed.index,
            failed.step,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
