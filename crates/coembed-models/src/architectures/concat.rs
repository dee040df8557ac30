//! Concatenation and inner-product heads.

use candle_core::{Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

use super::{check_vector_pair, squeeze_scores};
use crate::{AffinityModel, Architecture, ModelConfig, Projector, Result};

/// Raw concatenation through a three-layer classifier ending in a sigmoid.
pub struct SimpleConcat {
    fc1: Projector,
    fc2: Projector,
    fc3: Linear,
    mol_emb_size: usize,
    prot_emb_size: usize,
}

impl SimpleConcat {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let joint = config.mol_emb_size + config.prot_emb_size;
        Ok(Self {
            fc1: Projector::single(joint, config.hidden_dim_1, config.activation, vb.pp("fc1"))?,
            fc2: Projector::single(config.hidden_dim_1, config.hidden_dim_2, config.activation, vb.pp("fc2"))?,
            fc3: linear(config.hidden_dim_2, 1, vb.pp("fc3").pp("0"))?,
            mol_emb_size: config.mol_emb_size,
            prot_emb_size: config.prot_emb_size,
        })
    }
}

impl AffinityModel for SimpleConcat {
    fn forward_t(&self, mol: &Tensor, prot: &Tensor, train: bool) -> Result<Tensor> {
        check_vector_pair(mol, prot, self.mol_emb_size, self.prot_emb_size)?;
        let cat = Tensor::cat(&[mol, prot], 1)?;
        let h = self.fc2.forward_t(&self.fc1.forward_t(&cat, train)?, train)?;
        let logits = self.fc3.forward(&h)?;
        Ok(squeeze_scores(candle_nn::ops::sigmoid(&logits)?)?)
    }

    fn architecture(&self) -> Architecture {
        Architecture::SimpleConcat
    }

    fn latent_size(&self) -> Option<usize> {
        None
    }
}

/// Both sides projected, concatenated, and scored by a sigmoid head.
pub struct SeparateConcat {
    mol_projector: Projector,
    prot_projector: Projector,
    fc: Linear,
    mol_emb_size: usize,
    prot_emb_size: usize,
}

impl SeparateConcat {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let latent = config.latent_dim();
        Ok(Self {
            mol_projector: Projector::single(config.mol_emb_size, latent, config.activation, vb.pp("mol_projector"))?,
            prot_projector: Projector::single(config.prot_emb_size, latent, config.activation, vb.pp("prot_projector"))?,
            fc: linear(2 * latent, 1, vb.pp("fc").pp("0"))?,
            mol_emb_size: config.mol_emb_size,
            prot_emb_size: config.prot_emb_size,
        })
    }
}

impl AffinityModel for SeparateConcat {
    fn forward_t(&self, mol: &Tensor, prot: &Tensor, train: bool) -> Result<Tensor> {
        check_vector_pair(mol, prot, self.mol_emb_size, self.prot_emb_size)?;
        let mol_proj = self.mol_projector.forward_t(mol, train)?;
        let prot_proj = self.prot_projector.forward_t(prot, train)?;
        let cat = Tensor::cat(&[&mol_proj, &prot_proj], 1)?;
        let logits = self.fc.forward(&cat)?;
        Ok(squeeze_scores(candle_nn::ops::sigmoid(&logits)?)?)
    }

    fn architecture(&self) -> Architecture {
        Architecture::SeparateConcat
    }

    fn latent_size(&self) -> Option<usize> {
        Some(self.mol_projector.out_dim())
    }
}

/// Both sides projected, concatenated, and scored by an unbounded linear head.
pub struct AffinityEmbedConcat {
    mol_projector: Projector,
    prot_projector: Projector,
    fc: Linear,
    mol_emb_size: usize,
    prot_emb_size: usize,
}

impl AffinityEmbedConcat {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let latent = config.latent_dim();
        Ok(Self {
            mol_projector: Projector::single(config.mol_emb_size, latent, config.activation, vb.pp("mol_projector"))?,
            prot_projector: Projector::single(config.prot_emb_size, latent, config.activation, vb.pp("prot_projector"))?,
            fc: linear(2 * latent, 1, vb.pp("fc"))?,
            mol_emb_size: config.mol_emb_size,
            prot_emb_size: config.prot_emb_size,
        })
    }
}

impl AffinityModel for AffinityEmbedConcat {
    fn forward_t(&self, mol: &Tensor, prot: &Tensor, train: bool) -> Result<Tensor> {
        check_vector_pair(mol, prot, self.mol_emb_size, self.prot_emb_size)?;
        let mol_proj = self.mol_projector.forward_t(mol, train)?;
        let prot_proj = self.prot_projector.forward_t(prot, train)?;
        let cat = Tensor::cat(&[&mol_proj, &prot_proj], 1)?;
        Ok(squeeze_scores(self.fc.forward(&cat)?)?)
    }

    fn architecture(&self) -> Architecture {
        Architecture::AffinityEmbedConcat
    }

    fn latent_size(&self) -> Option<usize> {
        Some(self.mol_projector.out_dim())
    }
}

/// Both sides projected and combined by a per-pair inner product.
pub struct AffinityCoembedInner {
    mol_projector: Projector,
    prot_projector: Projector,
    mol_emb_size: usize,
    prot_emb_size: usize,
}

impl AffinityCoembedInner {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let latent = config.latent_dim();
        Ok(Self {
            mol_projector: Projector::single(config.mol_emb_size, latent, config.activation, vb.pp("mol_projector"))?,
            prot_projector: Projector::single(config.prot_emb_size, latent, config.activation, vb.pp("prot_projector"))?,
            mol_emb_size: config.mol_emb_size,
            prot_emb_size: config.prot_emb_size,
        })
    }
}

impl AffinityModel for AffinityCoembedInner {
    fn forward_t(&self, mol: &Tensor, prot: &Tensor, train: bool) -> Result<Tensor> {
        check_vector_pair(mol, prot, self.mol_emb_size, self.prot_emb_size)?;
        let mol_proj = self.mol_projector.forward_t(mol, train)?;
        let prot_proj = self.prot_projector.forward_t(prot, train)?;
        // (batch, 1, latent) x (batch, latent, 1) -> (batch, 1, 1)
        let inner = mol_proj.unsqueeze(1)?.matmul(&prot_proj.unsqueeze(2)?)?;
        Ok(inner.squeeze(2)?.squeeze(1)?)
    }

    fn architecture(&self) -> Architecture {
        Architecture::AffinityCoembedInner
    }

    fn latent_size(&self) -> Option<usize> {
        Some(self.mol_projector.out_dim())
    }
}

/// Raw concatenation through a single linear layer.
pub struct AffinityConcatLinear {
    fc: Linear,
    mol_emb_size: usize,
    prot_emb_size: usize,
}

impl AffinityConcatLinear {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            fc: linear(config.mol_emb_size + config.prot_emb_size, 1, vb.pp("fc"))?,
            mol_emb_size: config.mol_emb_size,
            prot_emb_size: config.prot_emb_size,
        })
    }
}

impl AffinityModel for AffinityConcatLinear {
    fn forward_t(&self, mol: &Tensor, prot: &Tensor, _train: bool) -> Result<Tensor> {
        check_vector_pair(mol, prot, self.mol_emb_size, self.prot_emb_size)?;
        let cat = Tensor::cat(&[mol, prot], 1)?;
        Ok(squeeze_scores(self.fc.forward(&cat)?)?)
    }

    fn architecture(&self) -> Architecture {
        Architecture::AffinityConcatLinear
    }

    fn latent_size(&self) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn config(arch: Architecture) -> ModelConfig {
        ModelConfig::new(arch)
            .with_embedding_sizes(7, 3)
            .with_latent_size(5)
            .with_hidden_sizes(8, 6, 4)
    }

    fn inputs(batch: usize) -> (Tensor, Tensor) {
        (
            Tensor::randn(0f32, 1f32, (batch, 7), &Device::Cpu).unwrap(),
            Tensor::randn(0f32, 1f32, (batch, 3), &Device::Cpu).unwrap(),
        )
    }

    #[test]
    fn test_sigmoid_heads_are_probabilities() {
        let (mol, prot) = inputs(6);
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let simple = SimpleConcat::new(&config(Architecture::SimpleConcat), vb.pp("a")).unwrap();
        let separate = SeparateConcat::new(&config(Architecture::SeparateConcat), vb.pp("b")).unwrap();
        for model in [&simple as &dyn AffinityModel, &separate] {
            let scores = model.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();
            assert_eq!(scores.len(), 6);
            assert!(scores.iter().all(|s| *s > 0.0 && *s < 1.0), "{scores:?}");
        }
    }

    #[test]
    fn test_batch_of_one_keeps_batch_dimension() {
        let (mol, prot) = inputs(1);
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let models: Vec<Box<dyn AffinityModel>> = vec![
            Box::new(SimpleConcat::new(&config(Architecture::SimpleConcat), vb.pp("a")).unwrap()),
            Box::new(AffinityEmbedConcat::new(&config(Architecture::AffinityEmbedConcat), vb.pp("b")).unwrap()),
            Box::new(AffinityCoembedInner::new(&config(Architecture::AffinityCoembedInner), vb.pp("c")).unwrap()),
            Box::new(AffinityConcatLinear::new(&config(Architecture::AffinityConcatLinear), vb.pp("d")).unwrap()),
        ];
        for model in &models {
            let scores = model.forward(&mol, &prot).unwrap();
            assert_eq!(scores.dims(), &[1], "{}", model.architecture());
        }
    }

    #[test]
    fn test_inner_product_matches_manual_dot() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = AffinityCoembedInner::new(&config(Architecture::AffinityCoembedInner), vb).unwrap();
        let (mol, prot) = inputs(3);
        let scores = model.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();

        let m = model.mol_projector.forward(&mol).unwrap().to_vec2::<f32>().unwrap();
        let p = model.prot_projector.forward(&prot).unwrap().to_vec2::<f32>().unwrap();
        for i in 0..3 {
            let dot: f32 = m[i].iter().zip(&p[i]).map(|(a, b)| a * b).sum();
            assert!((scores[i] - dot).abs() < 1e-4);
        }
    }

    #[test]
    fn test_head_parameter_names() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        SimpleConcat::new(&config(Architecture::SimpleConcat), vb.clone()).unwrap();
        AffinityConcatLinear::new(&config(Architecture::AffinityConcatLinear), vb.pp("linear")).unwrap();
        let data = varmap.data().lock().unwrap();
        assert!(data.contains_key("fc1.0.weight"));
        assert!(data.contains_key("fc2.0.bias"));
        assert!(data.contains_key("fc3.0.weight"));
        assert_eq!(data["linear.fc.weight"].dims(), &[1, 10]);
    }
}
