//! Latent-space distance metrics.

use std::fmt;
use std::str::FromStr;

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

use crate::{AffinityError, Result};

/// Lower bound on the norm product in cosine similarity.
pub const COSINE_EPS: f32 = 1e-8;

/// Metric used to compare a molecule latent vector with a protein latent vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum DistanceMetric {
    /// Cosine similarity, range [-1, 1]
    #[default]
    Cosine,

    /// Cosine similarity squared, range [0, 1]
    SquaredCosine,

    /// L2 distance between matching rows
    Euclidean,

    /// L2 distance squared
    SquaredEuclidean,
}

impl DistanceMetric {
    pub const ALL: [DistanceMetric; 4] = [
        DistanceMetric::Cosine,
        DistanceMetric::SquaredCosine,
        DistanceMetric::Euclidean,
        DistanceMetric::SquaredEuclidean,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "Cosine",
            DistanceMetric::SquaredCosine => "SquaredCosine",
            DistanceMetric::Euclidean => "Euclidean",
            DistanceMetric::SquaredEuclidean => "SquaredEuclidean",
        }
    }

    /// Whether the metric has a fixed output range.
    pub fn is_bounded(&self) -> bool {
        matches!(self, DistanceMetric::Cosine | DistanceMetric::SquaredCosine)
    }

    /// Score matching rows of two latent batches.
    ///
    /// # Arguments
    /// * `x1` - Tensor of shape (batch_size, latent_dim)
    /// * `x2` - Tensor of shape (batch_size, latent_dim)
    ///
    /// # Returns
    /// Tensor of shape (batch_size,)
    pub fn compute(&self, x1: &Tensor, x2: &Tensor) -> Result<Tensor> {
        check_same_shape(x1, x2)?;
        let out = match self {
            DistanceMetric::Cosine => cosine_similarity(x1, x2)?,
            DistanceMetric::SquaredCosine => cosine_similarity(x1, x2)?.sqr()?,
            DistanceMetric::Euclidean => euclidean_distance(x1, x2)?,
            DistanceMetric::SquaredEuclidean => squared_euclidean_distance(x1, x2)?,
        };
        Ok(out)
    }

    /// Score every row of `x1` against every row of `x2`.
    ///
    /// Returns a (n1, n2) matrix. For the Euclidean metrics this is the
    /// full `cdist` matrix; its diagonal equals [`DistanceMetric::compute`].
    pub fn pairwise(&self, x1: &Tensor, x2: &Tensor) -> Result<Tensor> {
        let (_, d1) = x1.dims2()?;
        let (_, d2) = x2.dims2()?;
        if d1 != d2 {
            return Err(AffinityError::ShapeMismatch(format!(
                "latent dimensions differ: {d1} vs {d2}"
            )));
        }
        let out = match self {
            DistanceMetric::Cosine => pairwise_cosine(x1, x2)?,
            DistanceMetric::SquaredCosine => pairwise_cosine(x1, x2)?.sqr()?,
            DistanceMetric::Euclidean => pairwise_euclidean(x1, x2)?,
            DistanceMetric::SquaredEuclidean => pairwise_euclidean(x1, x2)?.sqr()?,
        };
        Ok(out)
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceMetric {
    type Err = AffinityError;

    fn from_str(s: &str) -> Result<Self> {
        DistanceMetric::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AffinityError::UnknownMetric(s.to_string()))
    }
}

impl TryFrom<String> for DistanceMetric {
    type Error = AffinityError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DistanceMetric> for String {
    fn from(m: DistanceMetric) -> Self {
        m.name().to_string()
    }
}

fn check_same_shape(x1: &Tensor, x2: &Tensor) -> Result<()> {
    let (b1, d1) = x1.dims2()?;
    let (b2, d2) = x2.dims2()?;
    if (b1, d1) != (b2, d2) {
        return Err(AffinityError::ShapeMismatch(format!(
            "expected equal latent batches, got ({b1}, {d1}) and ({b2}, {d2})"
        )));
    }
    Ok(())
}

/// Row-wise cosine similarity of two (batch, dim) tensors.
pub fn cosine_similarity(x1: &Tensor, x2: &Tensor) -> candle_core::Result<Tensor> {
    let dot = (x1 * x2)?.sum(1)?;
    let n1 = x1.sqr()?.sum(1)?.sqrt()?;
    let n2 = x2.sqr()?.sum(1)?.sqrt()?;
    let denom = (n1 * n2)?.clamp(COSINE_EPS, f32::MAX)?;
    dot / denom
}

/// Row-wise L2 distance of two (batch, dim) tensors.
pub fn euclidean_distance(x1: &Tensor, x2: &Tensor) -> candle_core::Result<Tensor> {
    squared_euclidean_distance(x1, x2)?.sqrt()
}

fn squared_euclidean_distance(x1: &Tensor, x2: &Tensor) -> candle_core::Result<Tensor> {
    (x1 - x2)?.sqr()?.sum(1)
}

/// Full (n1, n2) cosine similarity matrix.
pub fn pairwise_cosine(x1: &Tensor, x2: &Tensor) -> candle_core::Result<Tensor> {
    let u1 = l2_normalize(x1)?;
    let u2 = l2_normalize(x2)?;
    u1.matmul(&u2.t()?.contiguous()?)
}

/// Full (n1, n2) L2 distance matrix.
pub fn pairwise_euclidean(x1: &Tensor, x2: &Tensor) -> candle_core::Result<Tensor> {
    // (n1, 1, d) - (1, n2, d) -> (n1, n2, d)
    let diff = x1.unsqueeze(1)?.broadcast_sub(&x2.unsqueeze(0)?)?;
    diff.sqr()?.sum(2)?.sqrt()
}

/// L2 normalize rows, leaving all-zero rows at zero.
pub fn l2_normalize(x: &Tensor) -> candle_core::Result<Tensor> {
    let norms = x.sqr()?.sum_keepdim(1)?.sqrt()?;
    let norms_clamped = norms.clamp(COSINE_EPS, f32::MAX)?;
    x.broadcast_div(&norms_clamped)
}
