//! coembed: score molecule-protein embedding pairs from the command line.
//!
//! - `architectures`: list the available models
//! - `init`: build a model with (seeded) random weights and save them
//! - `score`: score a pairs file with a configured model

mod commands;
mod input;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coembed")]
#[command(version)]
#[command(about = "Molecule-protein co-embedding affinity scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List architectures with their default latent size and output kind
    Architectures,
    /// Initialise weights for a configured model and save them as safetensors
    Init(commands::InitArgs),
    /// Score molecule/protein pairs and emit a JSON array
    Score(commands::ScoreArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coembed=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Architectures => commands::architectures(),
        Commands::Init(args) => commands::init(args).await?,
        Commands::Score(args) => commands::score(args).await?,
    }
    Ok(())
}
