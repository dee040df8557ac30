//! Feed-forward projectors into the shared latent space.

use candle_core::{Module, Tensor};
use candle_nn::{linear, Dropout, Linear, VarBuilder};

use crate::Activation;

/// A stack of `Linear -> [Dropout] -> Activation` blocks.
///
/// Parameters are laid out like a PyTorch `nn.Sequential`: without dropout
/// the linear layers sit at indices 0, 2, 4, ..., with dropout at 0, 3, 6, ...
/// so `prot_projector.3.weight` resolves the same way in both worlds.
#[derive(Debug, Clone)]
pub struct Projector {
    layers: Vec<Linear>,
    dropout: Option<Dropout>,
    activation: Activation,
    out_dim: usize,
}

impl Projector {
    /// Build a projector through the given layer widths.
    ///
    /// `dims = [in, hidden.., out]` yields `dims.len() - 1` linear layers.
    pub fn new(
        dims: &[usize],
        activation: Activation,
        dropout: Option<f32>,
        vb: VarBuilder,
    ) -> candle_core::Result<Self> {
        if dims.len() < 2 {
            candle_core::bail!("projector needs at least input and output widths, got {dims:?}");
        }
        let stride = if dropout.is_some() { 3 } else { 2 };
        let layers = dims
            .windows(2)
            .enumerate()
            .map(|(i, w)| linear(w[0], w[1], vb.pp((i * stride).to_string())))
            .collect::<candle_core::Result<Vec<_>>>()?;

        Ok(Self {
            layers,
            dropout: dropout.map(Dropout::new),
            activation,
            out_dim: dims[dims.len() - 1],
        })
    }

    /// Single `Linear -> Activation` block.
    pub fn single(in_dim: usize, out_dim: usize, activation: Activation, vb: VarBuilder) -> candle_core::Result<Self> {
        Self::new(&[in_dim, out_dim], activation, None, vb)
    }

    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Forward pass; dropout is only active when `train` is set.
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> candle_core::Result<Tensor> {
        let mut x = xs.clone();
        for layer in &self.layers {
            x = layer.forward(&x)?;
            if let Some(dropout) = &self.dropout {
                x = dropout.forward(&x, train)?;
            }
            x = self.activation.forward(&x)?;
        }
        Ok(x)
    }
}

impl Module for Projector {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        self.forward_t(xs, false)
    }
}
