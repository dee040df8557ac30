//! Configuration for affinity models and the scorer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Activation, AffinityError, Architecture, DistanceMetric, Result};

/// Construction-time hyperparameters of a scoring model.
///
/// Fields not used by the selected architecture are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Architecture name, e.g. "SimpleCosine"
    pub architecture: Architecture,

    /// Molecule embedding width (default: 2048)
    #[serde(default = "default_mol_emb_size")]
    pub mol_emb_size: usize,

    /// Protein embedding width, per residue for sequence models (default: 100)
    #[serde(default = "default_prot_emb_size")]
    pub prot_emb_size: usize,

    /// Shared latent width (default: 1024, 256 for LSTMCosine)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latent_size: Option<usize>,

    /// Hidden width of the DeepCosine protein tower (default: 4096)
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,

    /// First hidden width of SimpleConcat (default: 512)
    #[serde(default = "default_hidden_dim_1")]
    pub hidden_dim_1: usize,

    /// Second hidden width of SimpleConcat (default: 256)
    #[serde(default = "default_hidden_dim_2")]
    pub hidden_dim_2: usize,

    /// Stacked LSTM layers (default: 3)
    #[serde(default = "default_lstm_layers")]
    pub lstm_layers: usize,

    /// LSTM hidden width per direction (default: 256)
    #[serde(default = "default_lstm_dim")]
    pub lstm_dim: usize,

    /// Projection activation (default: ReLU)
    #[serde(default)]
    pub activation: Activation,

    /// Latent-space metric (default: Cosine)
    #[serde(default)]
    pub distance_metric: DistanceMetric,

    /// DeepCosine dropout probability (default: 0.5)
    #[serde(default = "default_dropout")]
    pub dropout: f32,
}

fn default_mol_emb_size() -> usize { 2048 }
fn default_prot_emb_size() -> usize { 100 }
fn default_hidden_size() -> usize { 4096 }
fn default_hidden_dim_1() -> usize { 512 }
fn default_hidden_dim_2() -> usize { 256 }
fn default_lstm_layers() -> usize { 3 }
fn default_lstm_dim() -> usize { 256 }
fn default_dropout() -> f32 { 0.5 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(Architecture::SimpleCosine)
    }
}

impl ModelConfig {
    /// Default hyperparameters for an architecture.
    pub fn new(architecture: Architecture) -> Self {
        Self {
            architecture,
            mol_emb_size: default_mol_emb_size(),
            prot_emb_size: default_prot_emb_size(),
            latent_size: None,
            hidden_size: default_hidden_size(),
            hidden_dim_1: default_hidden_dim_1(),
            hidden_dim_2: default_hidden_dim_2(),
            lstm_layers: default_lstm_layers(),
            lstm_dim: default_lstm_dim(),
            activation: Activation::default(),
            distance_metric: DistanceMetric::default(),
            dropout: default_dropout(),
        }
    }

    /// Latent width after applying the architecture default.
    pub fn latent_dim(&self) -> usize {
        self.latent_size
            .unwrap_or_else(|| self.architecture.default_latent_size())
    }

    pub fn with_embedding_sizes(mut self, mol_emb_size: usize, prot_emb_size: usize) -> Self {
        self.mol_emb_size = mol_emb_size;
        self.prot_emb_size = prot_emb_size;
        self
    }

    pub fn with_latent_size(mut self, size: usize) -> Self {
        self.latent_size = Some(size);
        self
    }

    /// Set the DeepCosine hidden width and the two SimpleConcat widths.
    pub fn with_hidden_sizes(mut self, hidden_size: usize, hidden_dim_1: usize, hidden_dim_2: usize) -> Self {
        self.hidden_size = hidden_size;
        self.hidden_dim_1 = hidden_dim_1;
        self.hidden_dim_2 = hidden_dim_2;
        self
    }

    pub fn with_lstm(mut self, layers: usize, dim: usize) -> Self {
        self.lstm_layers = layers;
        self.lstm_dim = dim;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    pub fn with_dropout(mut self, p: f32) -> Self {
        self.dropout = p;
        self
    }

    /// Reject configurations no architecture can be built from.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("mol_emb_size", self.mol_emb_size),
            ("prot_emb_size", self.prot_emb_size),
            ("latent_size", self.latent_dim()),
            ("hidden_size", self.hidden_size),
            ("hidden_dim_1", self.hidden_dim_1),
            ("hidden_dim_2", self.hidden_dim_2),
            ("lstm_layers", self.lstm_layers),
            ("lstm_dim", self.lstm_dim),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            return Err(AffinityError::InvalidConfig(format!("{name} must be positive")));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(AffinityError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }
}

/// Configuration for [`crate::AffinityScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Pairs per forward pass (default: 32)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Use GPU if available (default: false)
    #[serde(default)]
    pub use_gpu: bool,

    /// Seed for deterministic parameter initialisation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// safetensors checkpoint to load after construction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<String>,

    /// Model hyperparameters
    pub model: ModelConfig,
}

fn default_batch_size() -> usize { 32 }

impl Default for ScorerConfig {
    fn default() -> Self {
        Self::cpu(ModelConfig::default())
    }
}

impl ScorerConfig {
    /// Create config for CPU-only inference.
    pub fn cpu(model: ModelConfig) -> Self {
        Self {
            model,
            batch_size: default_batch_size(),
            use_gpu: false,
            seed: None,
            checkpoint: None,
        }
    }

    /// Create config for GPU inference.
    pub fn gpu(model: ModelConfig) -> Self {
        Self {
            use_gpu: true,
            ..Self::cpu(model)
        }
    }

    /// Set batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Seed the parameter initialisation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load weights from a safetensors file.
    pub fn with_checkpoint(mut self, path: impl Into<String>) -> Self {
        self.checkpoint = Some(path.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(AffinityError::InvalidConfig("batch_size must be positive".to_string()));
        }
        self.model.validate()
    }

    /// Load from TOML file
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load from YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load from JSON file
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load by file extension: `.toml`, `.yaml`/`.yml` or `.json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(path),
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            Some("json") => Self::from_json(path),
            other => Err(AffinityError::InvalidConfig(format!(
                "unsupported config format {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Save to TOML file
    pub fn to_toml(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
