//! Architecture registry: selection of a scoring model by name.

use std::fmt;
use std::str::FromStr;

use candle_core::Tensor;
use candle_nn::VarBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::architectures::{
    AffinityCoembedInner, AffinityConcatLinear, AffinityEmbedConcat, CosineBatchNorm, DeepCosine,
    LstmCosine, SeparateConcat, SimpleConcat, SimpleCosine,
};
use crate::{AffinityError, DistanceMetric, ModelConfig, Result};

/// A molecule-protein scoring network.
pub trait AffinityModel: Send + Sync {
    /// Score a batch of pairs.
    ///
    /// `mol` is (batch, mol_emb_size). `prot` is (batch, prot_emb_size), or
    /// (batch, seq_len, prot_emb_size) for sequence models. Returns (batch,).
    fn forward_t(&self, mol: &Tensor, prot: &Tensor, train: bool) -> Result<Tensor>;

    /// Evaluation-mode forward pass.
    fn forward(&self, mol: &Tensor, prot: &Tensor) -> Result<Tensor> {
        self.forward_t(mol, prot, false)
    }

    fn architecture(&self) -> Architecture;

    /// Shared latent width, if the model projects into one.
    fn latent_size(&self) -> Option<usize>;
}

/// Known architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Architecture {
    SimpleCosine,
    CosineBatchNorm,
    LstmCosine,
    DeepCosine,
    SimpleConcat,
    SeparateConcat,
    AffinityEmbedConcat,
    AffinityCoembedInner,
    AffinityConcatLinear,
}

impl Architecture {
    pub const ALL: [Architecture; 9] = [
        Architecture::SimpleCosine,
        Architecture::CosineBatchNorm,
        Architecture::LstmCosine,
        Architecture::DeepCosine,
        Architecture::SimpleConcat,
        Architecture::SeparateConcat,
        Architecture::AffinityEmbedConcat,
        Architecture::AffinityCoembedInner,
        Architecture::AffinityConcatLinear,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Architecture::SimpleCosine => "SimpleCosine",
            Architecture::CosineBatchNorm => "CosineBatchNorm",
            Architecture::LstmCosine => "LSTMCosine",
            Architecture::DeepCosine => "DeepCosine",
            Architecture::SimpleConcat => "SimpleConcat",
            Architecture::SeparateConcat => "SeparateConcat",
            Architecture::AffinityEmbedConcat => "AffinityEmbedConcat",
            Architecture::AffinityCoembedInner => "AffinityCoembedInner",
            Architecture::AffinityConcatLinear => "AffinityConcatLinear",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Architecture::SimpleCosine => "dense projection of both embeddings, compared by a distance metric",
            Architecture::CosineBatchNorm => "dense projection + batch norm, compared by a distance metric",
            Architecture::LstmCosine => "bidirectional LSTM over protein residues, cosine similarity",
            Architecture::DeepCosine => "two-layer protein tower with dropout, cosine similarity",
            Architecture::SimpleConcat => "raw concatenation through a 3-layer sigmoid classifier",
            Architecture::SeparateConcat => "projected concatenation through a sigmoid head",
            Architecture::AffinityEmbedConcat => "projected concatenation through a linear head",
            Architecture::AffinityCoembedInner => "projected embeddings combined by inner product",
            Architecture::AffinityConcatLinear => "raw concatenation through a linear head",
        }
    }

    /// Default width of the shared latent space.
    pub fn default_latent_size(&self) -> usize {
        match self {
            Architecture::LstmCosine => 256,
            _ => 1024,
        }
    }

    /// Whether the protein input is a padded per-residue sequence.
    pub fn is_sequence_model(&self) -> bool {
        matches!(self, Architecture::LstmCosine)
    }

    /// Whether scores are probabilities in (0, 1).
    pub fn is_probability(&self) -> bool {
        matches!(self, Architecture::SimpleConcat | Architecture::SeparateConcat)
    }

    /// Whether the configured distance metric is honoured.
    pub fn uses_distance_metric(&self) -> bool {
        matches!(self, Architecture::SimpleCosine | Architecture::CosineBatchNorm)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Architecture {
    type Err = AffinityError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("SimplePLMModel") {
            return Ok(Architecture::AffinityEmbedConcat);
        }
        Architecture::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AffinityError::UnknownArchitecture(s.to_string()))
    }
}

impl TryFrom<String> for Architecture {
    type Error = AffinityError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Architecture> for String {
    fn from(a: Architecture) -> Self {
        a.name().to_string()
    }
}

/// Build the model described by `config`, registering its parameters in `vb`.
pub fn build_model(config: &ModelConfig, vb: VarBuilder) -> Result<Box<dyn AffinityModel>> {
    config.validate()?;

    let arch = config.architecture;
    if !arch.uses_distance_metric() && config.distance_metric != DistanceMetric::default() {
        warn!(
            "{} has a fixed scoring head; ignoring distance_metric = {}",
            arch, config.distance_metric
        );
    }
    debug!("Building {} (mol={}, prot={})", arch, config.mol_emb_size, config.prot_emb_size);

    let model: Box<dyn AffinityModel> = match arch {
        Architecture::SimpleCosine => Box::new(SimpleCosine::new(config, vb)?),
        Architecture::CosineBatchNorm => Box::new(CosineBatchNorm::new(config, vb)?),
        Architecture::LstmCosine => Box::new(LstmCosine::new(config, vb)?),
        Architecture::DeepCosine => Box::new(DeepCosine::new(config, vb)?),
        Architecture::SimpleConcat => Box::new(SimpleConcat::new(config, vb)?),
        Architecture::SeparateConcat => Box::new(SeparateConcat::new(config, vb)?),
        Architecture::AffinityEmbedConcat => Box::new(AffinityEmbedConcat::new(config, vb)?),
        Architecture::AffinityCoembedInner => Box::new(AffinityCoembedInner::new(config, vb)?),
        Architecture::AffinityConcatLinear => Box::new(AffinityConcatLinear::new(config, vb)?),
    };
    Ok(model)
}
