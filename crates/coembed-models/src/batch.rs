//! Batching and padding utilities.

use candle_core::{Device, Tensor};

use crate::{AffinityError, Result};

/// Stack equal-width rows into a (batch, dim) tensor.
pub fn rows_to_tensor(rows: &[Vec<f32>], dim: usize, device: &Device) -> Result<Tensor> {
    let mut flat = Vec::with_capacity(rows.len() * dim);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != dim {
            return Err(AffinityError::InvalidInput(format!(
                "row {i} has width {}, expected {dim}",
                row.len()
            )));
        }
        flat.extend_from_slice(row);
    }
    Ok(Tensor::from_vec(flat, (rows.len(), dim), device)?)
}

/// Zero-pad per-residue sequences at the end into (batch, max_len, dim).
///
/// Returns the padded tensor and the unpadded lengths.
pub fn sequences_to_tensor(
    sequences: &[Vec<Vec<f32>>],
    dim: usize,
    device: &Device,
) -> Result<(Tensor, Vec<usize>)> {
    let lengths: Vec<usize> = sequences.iter().map(|s| s.len()).collect();
    let max_len = lengths.iter().copied().max().unwrap_or(0);
    if max_len == 0 {
        return Err(AffinityError::InvalidInput("all protein sequences are empty".to_string()));
    }

    let mut flat = Vec::with_capacity(sequences.len() * max_len * dim);
    for (i, seq) in sequences.iter().enumerate() {
        for (j, residue) in seq.iter().enumerate() {
            if residue.len() != dim {
                return Err(AffinityError::InvalidInput(format!(
                    "sequence {i} residue {j} has width {}, expected {dim}",
                    residue.len()
                )));
            }
            flat.extend_from_slice(residue);
        }
        flat.extend(std::iter::repeat_n(0.0f32, (max_len - seq.len()) * dim));
    }

    let tensor = Tensor::from_vec(flat, (sequences.len(), max_len, dim), device)?;
    Ok((tensor, lengths))
}

/// Pad (seq_len, dim) tensors with zeros at the end and stack them batch-first.
pub fn pad_sequences(sequences: &[Tensor]) -> Result<Tensor> {
    let first = sequences
        .first()
        .ok_or_else(|| AffinityError::InvalidInput("no sequences to pad".to_string()))?;
    let (_, dim) = first.dims2()?;
    let mut max_len = 0;
    for seq in sequences {
        let (len, d) = seq.dims2()?;
        if d != dim {
            return Err(AffinityError::ShapeMismatch(format!(
                "sequence width {d}, expected {dim}"
            )));
        }
        max_len = max_len.max(len);
    }

    let padded = sequences
        .iter()
        .map(|seq| {
            let len = seq.dim(0)?;
            if len == max_len {
                return Ok(seq.clone());
            }
            let pad = Tensor::zeros((max_len - len, dim), seq.dtype(), seq.device())?;
            Tensor::cat(&[seq, &pad], 0)
        })
        .collect::<candle_core::Result<Vec<_>>>()?;

    Ok(Tensor::stack(&padded, 0)?)
}

/// Chunk a slice into batches of specified size.
pub fn chunk_slice<T>(slice: &[T], batch_size: usize) -> Vec<&[T]> {
    slice.chunks(batch_size.max(1)).collect()
}
