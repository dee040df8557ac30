//! Deterministic parameter initialisation.

use candle_core::Tensor;
use candle_nn::VarMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::{AffinityError, Result};

/// Re-initialise dense and recurrent parameters from `seed`.
///
/// Every rank-2 weight and its matching bias is drawn from
/// U(-1/sqrt(fan_in), 1/sqrt(fan_in)), visiting parameters in name order.
/// Batch-norm statistics and affine parameters keep their defaults.
pub fn seed_parameters(varmap: &VarMap, seed: u64) -> Result<usize> {
    let data = varmap
        .data()
        .lock()
        .map_err(|e| AffinityError::Inference(format!("parameter map poisoned: {e}")))?;

    let mut names: Vec<&String> = data.keys().collect();
    names.sort();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut seeded = 0;
    for name in names {
        let var = &data[name];
        let Some(fan_in) = fan_in(name, var.as_tensor(), |n| data.get(n).map(|v| v.as_tensor())) else {
            continue;
        };
        let bound = 1.0 / (fan_in as f32).sqrt();
        let values: Vec<f32> = (0..var.elem_count())
            .map(|_| rng.gen_range(-bound..bound))
            .collect();
        let fresh = Tensor::from_vec(values, var.shape().clone(), var.device())?.to_dtype(var.dtype())?;
        var.set(&fresh)?;
        seeded += 1;
    }

    debug!("Seeded {} parameter tensors with seed {}", seeded, seed);
    Ok(seeded)
}

/// Fan-in of a weight, or of the weight a bias belongs to.
fn fan_in<'a>(name: &str, tensor: &Tensor, lookup: impl Fn(&str) -> Option<&'a Tensor>) -> Option<usize> {
    let dims = tensor.dims();
    if dims.len() == 2 {
        return Some(dims[1]).filter(|d| *d > 0);
    }
    if dims.len() != 1 {
        return None;
    }
    let (prefix, leaf) = match name.rsplit_once('.') {
        Some((prefix, leaf)) => (Some(prefix), leaf),
        None => (None, name),
    };
    let weight_leaf = leaf.strip_prefix("bias")?;
    let weight_name = match prefix {
        Some(prefix) => format!("{prefix}.weight{weight_leaf}"),
        None => format!("weight{weight_leaf}"),
    };
    let weight = lookup(&weight_name)?;
    match weight.dims() {
        [_, fan_in] if *fan_in > 0 => Some(*fan_in),
        _ => None,
    }
}
