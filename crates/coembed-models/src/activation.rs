//! Latent activations.

use std::fmt;
use std::str::FromStr;

use candle_core::{Module, Tensor};
use serde::{Deserialize, Serialize};

use crate::AffinityError;

/// Non-linearity applied after a projection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Activation {
    #[default]
    Relu,
    Gelu,
    Tanh,
    Sigmoid,
    Silu,
    /// No-op, useful for linear projectors
    Identity,
}

impl Activation {
    pub const ALL: [Activation; 6] = [
        Activation::Relu,
        Activation::Gelu,
        Activation::Tanh,
        Activation::Sigmoid,
        Activation::Silu,
        Activation::Identity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Activation::Relu => "ReLU",
            Activation::Gelu => "GELU",
            Activation::Tanh => "Tanh",
            Activation::Sigmoid => "Sigmoid",
            Activation::Silu => "SiLU",
            Activation::Identity => "Identity",
        }
    }
}

impl Module for Activation {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            Activation::Relu => xs.relu(),
            Activation::Gelu => xs.gelu_erf(),
            Activation::Tanh => xs.tanh(),
            Activation::Sigmoid => candle_nn::ops::sigmoid(xs),
            Activation::Silu => xs.silu(),
            Activation::Identity => Ok(xs.clone()),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = AffinityError;

    /// Accepts "ReLU", "relu", "nn.ReLU" and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches("nn.");
        Activation::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| AffinityError::UnknownActivation(s.to_string()))
    }
}

impl TryFrom<String> for Activation {
    type Error = AffinityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Activation> for String {
    fn from(a: Activation) -> Self {
        a.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_parse_names() {
        assert_eq!("ReLU".parse::<Activation>().unwrap(), Activation::Relu);
        assert_eq!("nn.ReLU".parse::<Activation>().unwrap(), Activation::Relu);
        assert_eq!("silu".parse::<Activation>().unwrap(), Activation::Silu);
        assert!(matches!(
            "Swish2".parse::<Activation>(),
            Err(AffinityError::UnknownActivation(_))
        ));
    }

    #[test]
    fn test_relu_and_identity() {
        let x = Tensor::new(&[-1.0f32, 0.5, 2.0], &Device::Cpu).unwrap();
        let relu = Activation::Relu.forward(&x).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(relu, vec![0.0, 0.5, 2.0]);
        let id = Activation::Identity.forward(&x).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(id, vec![-1.0, 0.5, 2.0]);
    }

    #[test]
    fn test_sigmoid_range() {
        let x = Tensor::new(&[-30.0f32, 0.0, 30.0], &Device::Cpu).unwrap();
        let y = Activation::Sigmoid.forward(&x).unwrap().to_vec1::<f32>().unwrap();
        assert!((y[1] - 0.5).abs() < 1e-6);
        assert!(y.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
