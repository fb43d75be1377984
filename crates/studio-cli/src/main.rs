use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::history::DefaultHistory;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use studio_application::StudioUseCase;
use studio_core::error::GenerationError;
use studio_core::generation::{ImageGenerator, TryOnRequest, TurnaroundRequest};
use studio_core::image::ImageRef;
use studio_core::{StudioError, StudioState};
use studio_infrastructure::storage::{ConfigStorage, KeyValueStore, SecretStorage};
use studio_infrastructure::{FileStore, MemoryStore, StoreBackedRepository, StudioPaths};
use studio_interaction::{GeminiImageClient, HttpImageResolver};

mod command;
mod helper;
mod session;

use command::Command;
use helper::CliHelper;
use session::{Flow, Session};

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Style Studio - AI virtual try-on wizard", long_about = None)]
struct Cli {
    /// Directory of the persistent store (overrides config.toml)
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image generation model
    #[arg(long)]
    model: Option<String>,

    /// Keep libraries and history in memory for this session only
    #[arg(long)]
    ephemeral: bool,
}

/// Stand-in generator used when no API key is configured.
struct UnconfiguredGenerator;

#[async_trait]
impl ImageGenerator for UnconfiguredGenerator {
    async fn generate_item(&self, _description: &str) -> studio_core::Result<ImageRef> {
        Err(GenerationError::MissingApiKey.into())
    }

    async fn generate_try_on(&self, _request: TryOnRequest) -> studio_core::Result<ImageRef> {
        Err(GenerationError::MissingApiKey.into())
    }

    async fn generate_turnaround(&self, _request: TurnaroundRequest) -> studio_core::Result<ImageRef> {
        Err(GenerationError::MissingApiKey.into())
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_store(cli: &Cli, config: &studio_core::config::StudioConfig) -> Result<Arc<dyn KeyValueStore>> {
    let quota = config.storage.quota_or_default();
    if cli.ephemeral {
        tracing::info!("Using in-memory store ({} bytes)", quota);
        return Ok(Arc::new(MemoryStore::with_quota(quota)));
    }

    let dir = match cli.store_dir.clone().or_else(|| config.storage.directory.clone()) {
        Some(dir) => dir,
        None => StudioPaths::store_dir().context("Cannot determine the data directory; pass --store-dir")?,
    };
    tracing::info!("Using store at {} ({} bytes)", dir.display(), quota);
    Ok(Arc::new(FileStore::with_quota(dir, quota)))
}

fn open_generator(cli: &Cli, config: &studio_core::config::StudioConfig) -> Arc<dyn ImageGenerator> {
    let secrets = match SecretStorage::new() {
        Ok(secrets) => secrets,
        Err(e) => {
            tracing::warn!("Secret file unavailable: {}", e);
            SecretStorage::with_path(PathBuf::from("secret.json"))
        }
    };

    match GeminiImageClient::from_config(config, &secrets, cli.model.as_deref()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            println!(
                "{}",
                format!(
                    "{} Browsing works, generation is disabled.",
                    StudioError::from(e).user_message()
                )
                .yellow()
            );
            Arc::new(UnconfiguredGenerator)
        }
    }
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<StudioError>() {
        Some(studio) => eprintln!("{}", studio.user_message().red()),
        None => eprintln!("{}", format!("Error: {:#}", err).red()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_storage = match &cli.config {
        Some(path) => ConfigStorage::new(path.clone()),
        None => ConfigStorage::default_location()
            .unwrap_or_else(|_| ConfigStorage::new(PathBuf::from("config.toml"))),
    };
    let config = config_storage
        .load()
        .with_context(|| format!("Failed to load {}", config_storage.path().display()))?;

    let store = open_store(&cli, &config)?;
    let state = StudioState::load(StoreBackedRepository::new(store));
    let loaded = session::describe_loaded(&state);
    let generator = open_generator(&cli, &config);
    let use_case = Arc::new(StudioUseCase::new(
        state,
        generator,
        Arc::new(HttpImageResolver::new()),
    ));

    let (event_tx, event_rx) = mpsc::channel(16);
    let printer = tokio::spawn(session::print_events(event_rx));
    let mut session = Session::new(use_case, event_tx);

    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== Style Studio ===".bright_magenta().bold());
    println!("{}", format!("Loaded {}.", loaded).bright_black());
    println!(
        "{}",
        "Type 'help' for commands, 'subjects' to start, or 'quit' to exit.".bright_black()
    );
    println!();

    loop {
        match rl.readline("studio> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let command = match trimmed.parse::<Command>() {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{}", message.yellow());
                        continue;
                    }
                };

                match session.execute(command).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Err(err) => report(&err),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    // Dropping the session closes the channel once pending tasks finish.
    drop(session);
    let _ = printer.await;

    Ok(())
}
