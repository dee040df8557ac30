//! Coembed Affinity Models
//!
//! Pure Rust molecule-protein binding models using Candle (Hugging Face).
//! Each architecture scores a pair of pre-computed embeddings: a molecule
//! fingerprint and a protein language-model embedding.
//!
//! # Features
//! - Two-tower co-embedding models compared by cosine or Euclidean metrics
//! - Bidirectional LSTM tower for per-residue protein embeddings
//! - Concatenation classifiers for binary affinity prediction
//! - PyTorch-compatible parameter names for safetensors checkpoints
//! - GPU support (CUDA, Metal) with automatic fallback to CPU
//!
//! # Example
//! ```rust,no_run
//! use coembed_models::{AffinityScorer, Architecture, ModelConfig, ScorerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScorerConfig::cpu(ModelConfig::new(Architecture::SimpleCosine)).with_seed(0);
//!     let scorer = AffinityScorer::new(config).await?;
//!
//!     let molecules = vec![vec![0.0f32; 2048]; 4];
//!     let proteins = vec![vec![0.1f32; 100]; 4];
//!
//!     let scores = scorer.score(&molecules, &proteins)?;
//!     println!("{:?}", scores); // 4 values in [-1, 1]
//!
//!     Ok(())
//! }
//! ```

pub mod activation;
pub mod architectures;
pub mod batch;
pub mod config;
pub mod error;
pub mod init;
pub mod metric;
pub mod projector;
pub mod recurrent;
pub mod registry;
pub mod scorer;

pub use activation::Activation;
pub use config::{ModelConfig, ScorerConfig};
pub use error::{AffinityError, Result};
pub use init::seed_parameters;
pub use metric::DistanceMetric;
pub use projector::Projector;
pub use recurrent::BiLstmEncoder;
pub use registry::{build_model, AffinityModel, Architecture};
pub use scorer::AffinityScorer;
