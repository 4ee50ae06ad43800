mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use nomadish::config::NomadishConfig;

#[derive(Parser)]
#[command(name = "nomadish", version, about = "Food memory journal: local cache and server sync")]
struct Cli {
    /// Config file (default: ~/.nomadish/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List cached memories
    List,
    /// Show one memory in full
    Show { id: String },
    /// Fetch all memories from the server and replace the cache
    Refresh,
    /// Add a memory with a photo
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Star rating, 1 to 5
        #[arg(long, default_value_t = nomadish::memory::types::DEFAULT_RATING)]
        rating: u8,
        #[arg(long, default_value = "")]
        notes: String,
        /// Photo file to upload
        #[arg(long)]
        photo: PathBuf,
    },
    /// Delete a memory on the server and locally
    Remove { id: String },
    /// Rating and sync statistics
    Stats,
    /// Print the cache as a JSON array
    Export,
    /// Merge memories from a JSON array file into the cache
    Import { file: PathBuf },
    /// Check the cache for problems
    Doctor,
    /// Delete all cached memories
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => NomadishConfig::load_from(path)?,
        None => NomadishConfig::load()?,
    };

    // Log to stderr so stdout stays clean for `export`.
    let filter = EnvFilter::try_new(&config.logging.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::List => cli::inspect::list(&config).await?,
        Command::Show { id } => cli::inspect::show(&config, &id).await?,
        Command::Refresh => cli::sync::refresh(&config).await?,
        Command::Add {
            name,
            lat,
            lon,
            rating,
            notes,
            photo,
        } => {
            let input = cli::sync::AddInput {
                name,
                latitude: lat,
                longitude: lon,
                rating,
                notes,
                photo,
            };
            cli::sync::add(&config, input).await?
        }
        Command::Remove { id } => cli::sync::remove(&config, &id).await?,
        Command::Stats => cli::stats::stats(&config).await?,
        Command::Export => cli::export::export(&config)?,
        Command::Import { file } => cli::import::import(&config, &file).await?,
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Reset => cli::reset::reset(&config)?,
    }

    Ok(())
}
