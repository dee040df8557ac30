//! Bidirectional multi-layer LSTM encoder for per-residue protein embeddings.

use candle_core::{Tensor, D};
use candle_nn::rnn::Direction;
use candle_nn::{lstm, LSTMConfig, VarBuilder, LSTM, RNN};

/// Stacked bidirectional LSTM, batch-first.
///
/// Weight names follow `torch.nn.LSTM`: `weight_ih_l{k}`, `weight_hh_l{k}`,
/// `bias_ih_l{k}`, `bias_hh_l{k}` and the `_reverse` variants for the
/// backward direction.
#[derive(Debug, Clone)]
pub struct BiLstmEncoder {
    layers: Vec<(LSTM, LSTM)>,
    hidden_dim: usize,
}

impl BiLstmEncoder {
    pub fn new(in_dim: usize, hidden_dim: usize, num_layers: usize, vb: VarBuilder) -> candle_core::Result<Self> {
        if num_layers == 0 {
            candle_core::bail!("LSTM encoder needs at least one layer");
        }
        let mut layers = Vec::with_capacity(num_layers);
        for layer_idx in 0..num_layers {
            let layer_in = if layer_idx == 0 { in_dim } else { 2 * hidden_dim };
            let forward = lstm(
                layer_in,
                hidden_dim,
                LSTMConfig { layer_idx, direction: Direction::Forward, ..Default::default() },
                vb.clone(),
            )?;
            let backward = lstm(
                layer_in,
                hidden_dim,
                LSTMConfig { layer_idx, direction: Direction::Backward, ..Default::default() },
                vb.clone(),
            )?;
            layers.push((forward, backward));
        }
        Ok(Self { layers, hidden_dim })
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Width of the concatenated final hidden states.
    pub fn summary_dim(&self) -> usize {
        2 * self.layers.len() * self.hidden_dim
    }

    /// Encode a padded batch of sequences.
    ///
    /// # Arguments
    /// * `xs` - Tensor of shape (batch_size, seq_len, in_dim)
    ///
    /// # Returns
    /// Tensor of shape (batch_size, 2 * num_layers * hidden_dim): the final
    /// hidden state of every layer and direction, ordered
    /// `[l0 fwd, l0 bwd, l1 fwd, l1 bwd, ...]`.
    pub fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let (_batch, seq_len, _features) = xs.dims3()?;
        if seq_len == 0 {
            candle_core::bail!("cannot encode an empty sequence batch");
        }
        let reverse_idx = reversed_indices(seq_len, xs)?;

        let mut finals = Vec::with_capacity(2 * self.layers.len());
        let mut input = xs.contiguous()?;
        for (forward, backward) in &self.layers {
            let fwd_states = forward.seq(&input)?;
            let fwd_out = forward.states_to_tensor(&fwd_states)?;

            let reversed = input.index_select(&reverse_idx, 1)?;
            let bwd_states = backward.seq(&reversed)?;
            // Backward outputs come out in reversed time order.
            let bwd_out = backward
                .states_to_tensor(&bwd_states)?
                .index_select(&reverse_idx, 1)?;

            finals.push(last_hidden(&fwd_states)?);
            finals.push(last_hidden(&bwd_states)?);

            input = Tensor::cat(&[&fwd_out, &bwd_out], D::Minus1)?.contiguous()?;
        }

        Tensor::cat(&finals, 1)
    }
}

fn reversed_indices(seq_len: usize, like: &Tensor) -> candle_core::Result<Tensor> {
    let idx: Vec<u32> = (0..seq_len as u32).rev().collect();
    Tensor::new(idx.as_slice(), like.device())
}

fn last_hidden(states: &[candle_nn::rnn::LSTMState]) -> candle_core::Result<Tensor> {
    match states.last() {
        Some(state) => Ok(state.h().clone()),
        None => candle_core::bail!("LSTM produced no states"),
    }
}
