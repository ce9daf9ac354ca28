use anyhow::{Context, Result};
use clap::Parser;
use orpheus_app::cli::Cli;
use orpheus_app::config::{AppConfig, Settings};
use orpheus_app::startup::{build_engine, build_registry, load_operations_document};
use orpheus_core::{ConversationEngine, Metrics, SessionSummary};
use orpheus_interfaces::{ScriptedInterface, ScriptedOutput, TerminalInterface};
use orpheus_providers::OpenAICompatibleBackend;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Before tracing so RUST_LOG may come from .env.
    let dotenv = dotenvy::dotenv();
    init_tracing(cli.verbose);
    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => info!("No .env file found"),
        Err(e) => warn!("Failed to load .env: {}", e),
    }

    let settings = Settings::load(&cli.settings)?;
    let config = AppConfig::from_env(settings)?;
    let operations = load_operations_document(&cli.operations)?;

    let build = build_registry(&config).await;
    info!(
        "Registered tools: {} ({} sources unavailable)",
        build.registry.names().join(", "),
        build.diagnostics.len()
    );

    let backend = OpenAICompatibleBackend::new(config.backend_config())
        .context("Failed to create reasoning backend")?;
    let metrics = Metrics::new();
    let mut engine = build_engine(
        &config,
        Arc::new(backend),
        build.registry,
        &operations,
        metrics.clone(),
    );

    let one_shot = cli.message.is_some();
    let summary = match cli.message {
        Some(message) => run_once(&mut engine, message).await,
        None => {
            println!(
                "Enter prompts (type {} to exit):",
                config.settings.session.sentinel
            );
            engine.run(&TerminalInterface::new()).await
        }
    };

    let snapshot = metrics.snapshot();
    info!(
        "Session ended ({:?}): {} turns, {} failed, {} tool calls, tool success {:.1}%",
        summary.ended_by,
        summary.turns,
        summary.failed_turns,
        snapshot.tool_invocations,
        snapshot.tool_success_rate() * 100.0
    );

    if one_shot && summary.failed_turns > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Single turn through an in-memory interface; output is printed afterwards.
async fn run_once(engine: &mut ConversationEngine, message: String) -> SessionSummary {
    let interface = ScriptedInterface::new([message]);
    let summary = engine.run(&interface).await;

    for output in interface.outputs() {
        match output {
            ScriptedOutput::Text(text) => println!("{}", text),
            ScriptedOutput::Status(status) => eprintln!("{}", status),
            ScriptedOutput::Error(error) => eprintln!("Error: {}", error),
        }
    }
    summary
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
