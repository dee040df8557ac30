//! Scoring architectures.
//!
//! Every architecture maps `(mol_emb, prot_emb)` to one score per pair:
//! - two-tower models project both sides into a shared latent space and
//!   compare them (`cosine`, `lstm`),
//! - concatenation models feed the joined embeddings to a small head
//!   (`concat`).

mod concat;
mod cosine;
mod lstm;

pub use concat::{AffinityCoembedInner, AffinityConcatLinear, AffinityEmbedConcat, SeparateConcat, SimpleConcat};
pub use cosine::{CosineBatchNorm, DeepCosine, SimpleCosine};
pub use lstm::LstmCosine;

use candle_core::Tensor;

use crate::{AffinityError, Result};

/// Check a fixed-width pair batch and return its batch size.
pub(crate) fn check_vector_pair(mol: &Tensor, prot: &Tensor, mol_dim: usize, prot_dim: usize) -> Result<usize> {
    let (mol_batch, mol_width) = mol.dims2().map_err(|_| {
        AffinityError::ShapeMismatch(format!("molecule batch must be 2-D, got {:?}", mol.dims()))
    })?;
    let (prot_batch, prot_width) = prot.dims2().map_err(|_| {
        AffinityError::ShapeMismatch(format!("protein batch must be 2-D, got {:?}", prot.dims()))
    })?;
    check_widths(mol_width, mol_dim, prot_width, prot_dim)?;
    check_batches(mol_batch, prot_batch)
}

/// Check a molecule batch against a padded protein sequence batch.
pub(crate) fn check_sequence_pair(mol: &Tensor, prot: &Tensor, mol_dim: usize, prot_dim: usize) -> Result<usize> {
    let (mol_batch, mol_width) = mol.dims2().map_err(|_| {
        AffinityError::ShapeMismatch(format!("molecule batch must be 2-D, got {:?}", mol.dims()))
    })?;
    let (prot_batch, seq_len, prot_width) = prot.dims3().map_err(|_| {
        AffinityError::ShapeMismatch(format!(
            "protein batch must be (batch, seq_len, dim), got {:?}",
            prot.dims()
        ))
    })?;
    if seq_len == 0 {
        return Err(AffinityError::InvalidInput("protein sequences are empty".to_string()));
    }
    check_widths(mol_width, mol_dim, prot_width, prot_dim)?;
    check_batches(mol_batch, prot_batch)
}

fn check_widths(mol_width: usize, mol_dim: usize, prot_width: usize, prot_dim: usize) -> Result<()> {
    if mol_width != mol_dim {
        return Err(AffinityError::ShapeMismatch(format!(
            "molecule embedding width {mol_width}, model expects {mol_dim}"
        )));
    }
    if prot_width != prot_dim {
        return Err(AffinityError::ShapeMismatch(format!(
            "protein embedding width {prot_width}, model expects {prot_dim}"
        )));
    }
    Ok(())
}

fn check_batches(mol_batch: usize, prot_batch: usize) -> Result<usize> {
    if mol_batch != prot_batch {
        return Err(AffinityError::InvalidInput(format!(
            "batch sizes differ: {mol_batch} molecules vs {prot_batch} proteins"
        )));
    }
    Ok(mol_batch)
}

/// (batch, 1) -> (batch,), keeping the batch dimension even when it is 1.
pub(crate) fn squeeze_scores(scores: Tensor) -> candle_core::Result<Tensor> {
    scores.squeeze(1)
}
