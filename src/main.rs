//! ESILV assistant - CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tracing::{debug, error};

use esilv_assistant::{
    cli::{Args, Commands, Config, Verbosity},
    doctor::Doctor,
    embedding::Embedder,
    errors::AssistantError,
    logging::init_logging,
    ollama::OllamaClient,
    rag::{Assistant, MultiStoreRetriever},
    repl::{DisplayManager, ReplConfig, ReplSession, StoreSummary},
    session::ConversationTurn,
    store::load_stores,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn ollama_client(config: &Config) -> Result<OllamaClient> {
    OllamaClient::with_config(
        &config.ollama_url(),
        &config.models.embedding,
        &config.models.chat,
        config.request_timeout(),
    )
    .context("Failed to build the Ollama client")
}

/// Load the stores and wire the pipeline. Store errors end the process.
fn build_assistant(config: &Config) -> Result<Arc<Assistant>> {
    let client = Arc::new(ollama_client(config)?);
    let embedder = match config.models.dimension {
        Some(dimension) => Embedder::with_dimension(client.clone(), dimension),
        None => Embedder::new(client.clone()),
    };

    let stores = match load_stores(&config.resolved_stores()) {
        Ok(stores) => stores,
        Err(e) if e.is_startup_fatal() => {
            error!(error = %e, "Vector store could not be loaded");
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!("Check the [[stores]] paths in your configuration, or run `esilv-assistant doctor`.");
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Failed to load vector stores"),
    };

    let retriever = MultiStoreRetriever::shared(embedder, stores);
    Ok(Arc::new(Assistant::with_config(
        retriever,
        client,
        config.pipeline(),
    )))
}

async fn run_repl(config: &Config, verbosity: Verbosity) -> Result<()> {
    let assistant = build_assistant(config)?;
    let repl_config = ReplConfig {
        history_file: Some(config.history_file()),
        contacts_file: config.contacts_file(),
        show_progress: verbosity.show_progress(),
        verbose: verbosity.show_details(),
        display_chars: config.display.source_chars,
    };

    let mut repl = ReplSession::new(assistant, repl_config)?;
    repl.show_welcome(VERSION);
    repl.run().await
}

async fn run_ask(config: &Config, verbosity: Verbosity, question: &str) -> Result<()> {
    let assistant = build_assistant(config)?;
    let mut display = DisplayManager::new(verbosity.show_progress());

    display.start_thinking();
    let result = assistant.ask(question).await;
    display.finish_thinking();

    let answer = result.map_err(|e: AssistantError| {
        anyhow::anyhow!("Sorry, this question could not be answered: {}", e)
    })?;

    if verbosity == Verbosity::Quiet {
        println!("{}", answer.text);
        return Ok(());
    }

    display.show_answer(&answer, verbosity.show_details());
    let turn = ConversationTurn::from_answer(&answer, config.display.source_chars);
    if !turn.sources.is_empty() {
        display.show_sources(&turn);
    }
    Ok(())
}

async fn run_doctor(config: &Config) -> Result<()> {
    let doctor = Doctor::new(
        ollama_client(config)?,
        config.resolved_stores(),
        config.models.dimension,
    );

    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

fn show_stores(config: &Config) -> Result<()> {
    let specs = config.resolved_stores();
    let stores = load_stores(&specs).context("Failed to load vector stores")?;
    let summaries: Vec<StoreSummary> = stores.iter().map(StoreSummary::from_store).collect();

    let display = DisplayManager::new(false);
    display.show_stores(&summaries);
    for spec in &specs {
        println!("  {} {}", spec.name.dimmed(), spec.path.display().to_string().dimmed());
    }
    println!();
    Ok(())
}

fn show_config(config: &Config, args: &Args) -> Result<()> {
    let source = match &args.config {
        Some(path) => path.display().to_string(),
        None => Config::default_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in defaults".to_string()),
    };

    println!("\n{}", "ESILV Assistant Configuration".bold().cyan());
    println!("{}", format!("Source: {}", source).dimmed());
    println!("{}", "=".repeat(60).cyan());
    print!(
        "{}",
        toml::to_string_pretty(config).context("Failed to render configuration")?
    );
    println!("\nVerbosity: {}", args.verbosity().as_str());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(message) = args.validate() {
        eprintln!("{} {}", "Error:".red().bold(), message);
        std::process::exit(2);
    }

    let verbosity = args.verbosity();
    let mut config = Config::load(args.config.clone()).context("Failed to load configuration")?;
    config.apply_overrides(&args);
    config.validate().context("Invalid configuration")?;

    init_logging(verbosity.log_level(), &config.logging.level);
    DisplayManager::set_color(config.display.color_output);
    debug!(ollama = %config.ollama_url(), chat = %config.models.chat, "Configuration loaded");

    match args.resolved_command() {
        Commands::Start => run_repl(&config, verbosity).await?,
        Commands::Ask { question } => run_ask(&config, verbosity, &question).await?,
        Commands::Doctor => run_doctor(&config).await?,
        Commands::Stores => show_stores(&config)?,
        Commands::Config => show_config(&config, &args)?,
    }

    Ok(())
}
