//! Recurrent protein tower.

use candle_core::Tensor;
use candle_nn::VarBuilder;

use super::check_sequence_pair;
use crate::{Activation, AffinityModel, Architecture, BiLstmEncoder, DistanceMetric, ModelConfig, Projector, Result};

/// Molecule projector against a bidirectional LSTM over per-residue protein
/// embeddings; cosine similarity.
///
/// Padding positions are fed through the recurrence like any other step, so
/// callers should pad with zeros at the end of each sequence.
pub struct LstmCosine {
    mol_projector: Projector,
    rnn: BiLstmEncoder,
    prot_projector: Projector,
    mol_emb_size: usize,
    prot_emb_size: usize,
}

impl LstmCosine {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let latent = config.latent_dim();
        let rnn = BiLstmEncoder::new(config.prot_emb_size, config.lstm_dim, config.lstm_layers, vb.pp("rnn"))?;
        // The summary projection is always ReLU, independent of `activation`.
        let prot_projector = Projector::single(rnn.summary_dim(), latent, Activation::Relu, vb.pp("prot_projector"))?;
        Ok(Self {
            mol_projector: Projector::single(config.mol_emb_size, latent, config.activation, vb.pp("mol_projector"))?,
            rnn,
            prot_projector,
            mol_emb_size: config.mol_emb_size,
            prot_emb_size: config.prot_emb_size,
        })
    }
}

impl AffinityModel for LstmCosine {
    fn forward_t(&self, mol: &Tensor, prot: &Tensor, train: bool) -> Result<Tensor> {
        check_sequence_pair(mol, prot, self.mol_emb_size, self.prot_emb_size)?;
        let mol_proj = self.mol_projector.forward_t(mol, train)?;
        let prot_hidden = self.rnn.forward(prot)?;
        let prot_proj = self.prot_projector.forward_t(&prot_hidden, train)?;
        DistanceMetric::Cosine.compute(&mol_proj, &prot_proj)
    }

    fn architecture(&self) -> Architecture {
        Architecture::LstmCosine
    }

    fn latent_size(&self) -> Option<usize> {
        Some(self.mol_projector.out_dim())
    }
}
