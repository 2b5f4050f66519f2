pub mod config;
pub mod dendrite_web;
pub mod node;
pub mod peer;
pub mod serial;

use crate::serial::{DevDirectory, DeviceLocator};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "neurone")]
#[command(about = "Gasworks neurone - camera and network driven light sculpture node")]
struct Cli {
    /// Node configuration (JSON, or TOML when the extension is .toml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log every axon tick
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the neurone (default)
    Run,
    /// Print the effective configuration as JSON
    ShowConfig,
    /// Report the lighting device that would be used
    Devices {
        /// Directory to scan for serial adapters
        #[arg(long, default_value = "/dev")]
        root: PathBuf,
    },
}

fn run(config_path: PathBuf) -> anyhow::Result<()> {
    let config = config::load(&config_path);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(node::run_node(config))
}

fn show_config(config_path: PathBuf) -> anyhow::Result<()> {
    let config = config::load(&config_path);
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn devices(root: PathBuf) -> anyhow::Result<()> {
    let locator = DevDirectory::new(root);
    match locator.locate() {
        Some(device) => info!(device = ?device, "Lighting device found"),
        None => info!(root = ?locator.root(), "No lighting device found"),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(level)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }

    let config_path = cli.config.unwrap_or_else(config::default_config_path);

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config_path),
        Commands::ShowConfig => show_config(config_path),
        Commands::Devices { root } => devices(root),
    };

    if let Err(e) = result {
        error!(error = %e, "Fatal Error");
        std::process::exit(1);
    }
}
