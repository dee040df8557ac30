//! Score a few synthetic pairs with every architecture

use coembed_models::{AffinityScorer, Architecture, ModelConfig, ScorerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let molecules: Vec<Vec<f32>> = (0..3)
        .map(|i| (0..2048).map(|j| ((i * 7 + j) % 11 == 0) as u8 as f32).collect())
        .collect();
    let proteins: Vec<Vec<f32>> = (0..3)
        .map(|i| (0..100).map(|j| ((i + j) as f32 * 0.37).sin()).collect())
        .collect();
    // Per-residue embeddings of different lengths for the LSTM model
    let sequences: Vec<Vec<Vec<f32>>> = proteins
        .iter()
        .enumerate()
        .map(|(i, p)| vec![p.clone(); 4 + 3 * i])
        .collect();

    for arch in Architecture::ALL {
        let config = ScorerConfig::cpu(ModelConfig::new(arch)).with_seed(42);
        let scorer = AffinityScorer::new(config).await?;

        let start = std::time::Instant::now();
        let scores = if arch.is_sequence_model() {
            scorer.score_sequences(&molecules, &sequences)?
        } else {
            scorer.score(&molecules, &proteins)?
        };

        println!(
            "{:<22} {:>10} params  {:?}  ({:.2}ms)",
            arch.name(),
            scorer.parameter_count(),
            scores,
            start.elapsed().as_secs_f64() * 1000.0
        );
    }

    Ok(())
}
