//! rulesd - Local Rules Engine daemon
//!
//! Evaluates free text against a rule file using a locally hosted model,
//! over HTTP (`serve`) or directly from the command line (`check`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use rules_common::Config;
use rulesd::{AppState, OllamaGateway, RulesEngine};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Inputs evaluated by `check` when none are given
const SAMPLE_INPUTS: [&str; 5] = [
    "John Silva is 25 years old and email john@email.com",
    "TEXT IN ALL CAPS NEEDS TO BE CORRECTED",
    "Birth date: 31/02/2023",
    "Value: 1500 (above limit)",
    "console.log('Hello World');",
];

#[derive(Parser)]
#[command(name = "rulesd", version, about = "Local rules engine backed by Ollama")]
struct Cli {
    /// Config file (defaults: $RULESD_CONFIG, ./rulesd.toml, /etc/rulesd/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Listen port, overrides config and PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Evaluate texts directly and print the results
    Check {
        /// Texts to evaluate; built-in samples when omitted
        texts: Vec<String>,
    },
    /// Write a config file with default values
    InitConfig {
        #[arg(default_value = "rulesd.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            let mut config = load_config(cli.config)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            info!(
                "rulesd v{} starting (model {}, rules {})",
                env!("CARGO_PKG_VERSION"),
                config.ollama.model,
                config.rules.path.display()
            );
            OllamaGateway::new(&config.ollama).startup_check().await;
            rulesd::server::run(AppState::from_config(config)).await
        }
        Command::Check { texts } => {
            let config = load_config(cli.config)?;
            OllamaGateway::new(&config.ollama).startup_check().await;
            run_checks(&RulesEngine::from_config(&config), texts).await;
            Ok(())
        }
        Command::InitConfig { path } => {
            Config::save_default(&path)?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::load_from_path(&path)?;
            config.apply_env_overrides();
            Ok(config)
        }
        None => Ok(Config::load()),
    }
}

/// Evaluate each text in turn; a failure is reported and the run continues
async fn run_checks(engine: &RulesEngine, texts: Vec<String>) {
    let texts = if texts.is_empty() {
        SAMPLE_INPUTS.iter().map(|s| s.to_string()).collect()
    } else {
        texts
    };

    println!("Local Rules Engine - model {}\n", engine.model_name());

    for text in &texts {
        println!("Input: \"{}\"", text);
        match engine.evaluate(text).await {
            Ok(result) => {
                println!("Result:\n{}\n", result);
                println!("{}", "─".repeat(50));
            }
            Err(e) => eprintln!("Error: {}\n", e),
        }
    }
}
