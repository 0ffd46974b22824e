// Interrogation Room - terminal entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use interrogation_core::{KeyValueStore, MemoryStore};
use interrogation_llm::ProviderGateway;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use interrogation_room::commands::{execute, parse_command, render_levels, Command, Flow};
use interrogation_room::models::level::LevelCatalog;
use interrogation_room::state::AppState;
use interrogation_room::storage::{ConfigService, JsonFileStore};
use interrogation_room::utils::paths::{config_path, default_data_dir, store_dir};

#[derive(Parser, Debug)]
#[command(name = "interrogation-room")]
#[command(version, about = "Question an AI suspect until it breaks")]
struct Cli {
    /// Level to open (defaults to the configured level)
    #[arg(short, long)]
    level: Option<String>,

    /// Directory for config and saved progress
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to <data-dir>/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra levels in TOML, merged over the built-in ones
    #[arg(long)]
    levels_file: Option<PathBuf>,

    /// Never call a provider; the suspect answers from the offline script
    #[arg(long)]
    offline: bool,

    /// Keep progress in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_state(cli: &Cli) -> Result<(AppState, String)> {
    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()?,
    };
    let config_file = cli.config.clone().unwrap_or_else(|| config_path(&data_dir));
    let service = ConfigService::open(&config_file)
        .with_context(|| format!("loading config from {}", config_file.display()))?;
    let mut config = service.get_config().clone();
    config.apply_process_env();

    let mut catalog = LevelCatalog::builtin();
    if let Some(path) = &cli.levels_file {
        let extra = LevelCatalog::from_toml_file(path)
            .with_context(|| format!("loading levels from {}", path.display()))?;
        catalog.merge(extra);
    }

    let store: Arc<dyn KeyValueStore> = if cli.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::open(store_dir(&data_dir)).context("opening progress store")?)
    };

    let state = if cli.offline {
        AppState::with_gateway(&config, catalog, store, ProviderGateway::new(Vec::new()))
    } else {
        AppState::new(&config, catalog, store)?
    };
    let level = cli.level.clone().unwrap_or(config.default_level);
    Ok((state, level))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (state, level) = build_state(&cli)?;
    match execute(&state, Command::Open(level)).await {
        Ok(Flow::Continue(text)) => println!("{}\n", text),
        Ok(Flow::Quit) => return Ok(()),
        Err(e) => {
            println!("(!) {}\n{}\n", e, render_levels(&state.level_statuses()));
        }
    }
    println!("Type /help for commands.");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let flow = match parse_command(&line) {
            Ok(command) => execute(&state, command).await,
            Err(e) => Err(e),
        };
        match flow {
            Ok(Flow::Continue(text)) => println!("{}\n", text),
            Ok(Flow::Quit) => break,
            Err(e) => println!("(!) {}\n", e),
        }
    }
    Ok(())
}
