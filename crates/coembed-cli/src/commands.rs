//! Subcommand handlers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use coembed_models::{AffinityScorer, Architecture, ScorerConfig};
use tracing::info;

use crate::input::Pairs;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Scorer configuration (.toml, .yaml or .json)
    #[arg(long)]
    pub config: PathBuf,

    /// Where to write the safetensors weights
    #[arg(long)]
    pub out: PathBuf,

    /// Seed for parameter initialisation, overriding the config
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Scorer configuration (.toml, .yaml or .json)
    #[arg(long)]
    pub config: PathBuf,

    /// Safetensors weights, overriding the config checkpoint
    #[arg(long)]
    pub weights: Option<PathBuf>,

    /// Pairs JSON with "molecules" and "proteins" or "protein_sequences"
    #[arg(long)]
    pub input: PathBuf,

    /// Write scores here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn architectures() {
    println!("{:<22} {:>7}  {:<12} DESCRIPTION", "NAME", "LATENT", "OUTPUT");
    for arch in Architecture::ALL {
        let output = match arch {
            _ if arch.is_probability() => "probability",
            _ if arch.uses_distance_metric() => "metric",
            Architecture::LstmCosine | Architecture::DeepCosine => "cosine",
            _ => "logit",
        };
        println!(
            "{:<22} {:>7}  {:<12} {}",
            arch.name(),
            arch.default_latent_size(),
            output,
            arch.description()
        );
    }
}

pub async fn init(args: InitArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    config.checkpoint = None;
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    let scorer = AffinityScorer::new(config).await?;
    scorer
        .save(&args.out)
        .with_context(|| format!("writing weights to {}", args.out.display()))?;
    info!(
        "Initialised {} with {} parameters",
        scorer.architecture(),
        scorer.parameter_count()
    );
    Ok(())
}

pub async fn score(args: ScoreArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(weights) = &args.weights {
        config.checkpoint = Some(weights.to_string_lossy().into_owned());
    }

    let json = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("reading pairs from {}", args.input.display()))?;
    let pairs = Pairs::parse(&json).with_context(|| format!("parsing {}", args.input.display()))?;

    let scorer = AffinityScorer::new(config).await?;
    info!("Scoring {} pairs with {}", pairs.len(), scorer.architecture());
    let scores = match &pairs {
        Pairs::Vectors { molecules, proteins } => scorer.score(molecules, proteins)?,
        Pairs::Sequences { molecules, sequences } => scorer.score_sequences(molecules, sequences)?,
    };

    let body = serde_json::to_string(&scores)?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, body)
                .await
                .with_context(|| format!("writing scores to {}", path.display()))?;
            info!("Wrote {} scores to {:?}", scores.len(), path);
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ScorerConfig> {
    ScorerConfig::load(path).with_context(|| format!("loading config {}", path.display()))
}
