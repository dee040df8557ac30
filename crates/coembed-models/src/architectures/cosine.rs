//! Two-tower models compared in latent space.

use candle_core::{ModuleT, Tensor};
use candle_nn::{batch_norm, BatchNorm, BatchNormConfig, VarBuilder};

use super::check_vector_pair;
use crate::{AffinityModel, Architecture, DistanceMetric, ModelConfig, Projector, Result};

/// One dense layer per side, compared by the configured metric.
pub struct SimpleCosine {
    mol_projector: Projector,
    prot_projector: Projector,
    metric: DistanceMetric,
    mol_emb_size: usize,
    prot_emb_size: usize,
}

impl SimpleCosine {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let latent = config.latent_dim();
        Ok(Self {
            mol_projector: Projector::single(config.mol_emb_size, latent, config.activation, vb.pp("mol_projector"))?,
            prot_projector: Projector::single(config.prot_emb_size, latent, config.activation, vb.pp("prot_projector"))?,
            metric: config.distance_metric,
            mol_emb_size: config.mol_emb_size,
            prot_emb_size: config.prot_emb_size,
        })
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }
}

impl AffinityModel for SimpleCosine {
    fn forward_t(&self, mol: &Tensor, prot: &Tensor, train: bool) -> Result<Tensor> {
        check_vector_pair(mol, prot, self.mol_emb_size, self.prot_emb_size)?;
        let mol_proj = self.mol_projector.forward_t(mol, train)?;
        let prot_proj = self.prot_projector.forward_t(prot, train)?;
        self.metric.compute(&mol_proj, &prot_proj)
    }

    fn architecture(&self) -> Architecture {
        Architecture::SimpleCosine
    }

    fn latent_size(&self) -> Option<usize> {
        Some(self.mol_projector.out_dim())
    }
}

/// As [`SimpleCosine`], with batch normalisation over each projection.
///
/// In training mode the norms use batch statistics and update their running
/// averages; in evaluation mode they use the running averages.
pub struct CosineBatchNorm {
    mol_projector: Projector,
    prot_projector: Projector,
    mol_norm: BatchNorm,
    prot_norm: BatchNorm,
    metric: DistanceMetric,
    mol_emb_size: usize,
    prot_emb_size: usize,
}

impl CosineBatchNorm {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let latent = config.latent_dim();
        Ok(Self {
            mol_projector: Projector::single(config.mol_emb_size, latent, config.activation, vb.pp("mol_projector"))?,
            prot_projector: Projector::single(config.prot_emb_size, latent, config.activation, vb.pp("prot_projector"))?,
            mol_norm: batch_norm(latent, BatchNormConfig::default(), vb.pp("mol_norm"))?,
            prot_norm: batch_norm(latent, BatchNormConfig::default(), vb.pp("prot_norm"))?,
            metric: config.distance_metric,
            mol_emb_size: config.mol_emb_size,
            prot_emb_size: config.prot_emb_size,
        })
    }
}

impl AffinityModel for CosineBatchNorm {
    fn forward_t(&self, mol: &Tensor, prot: &Tensor, train: bool) -> Result<Tensor> {
        check_vector_pair(mol, prot, self.mol_emb_size, self.prot_emb_size)?;
        let mol_proj = self
            .mol_norm
            .forward_t(&self.mol_projector.forward_t(mol, train)?, train)?;
        let prot_proj = self
            .prot_norm
            .forward_t(&self.prot_projector.forward_t(prot, train)?, train)?;
        self.metric.compute(&mol_proj, &prot_proj)
    }

    fn architecture(&self) -> Architecture {
        Architecture::CosineBatchNorm
    }

    fn latent_size(&self) -> Option<usize> {
        Some(self.mol_projector.out_dim())
    }
}

/// Single-layer molecule tower against a two-layer protein tower with
/// dropout; cosine similarity.
pub struct DeepCosine {
    mol_projector: Projector,
    prot_projector: Projector,
    mol_emb_size: usize,
    prot_emb_size: usize,
}

impl DeepCosine {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let latent = config.latent_dim();
        Ok(Self {
            mol_projector: Projector::single(config.mol_emb_size, latent, config.activation, vb.pp("mol_projector"))?,
            prot_projector: Projector::new(
                &[config.prot_emb_size, config.hidden_size, latent],
                config.activation,
                Some(config.dropout),
                vb.pp("prot_projector"),
            )?,
            mol_emb_size: config.mol_emb_size,
            prot_emb_size: config.prot_emb_size,
        })
    }
}

impl AffinityModel for DeepCosine {
    fn forward_t(&self, mol: &Tensor, prot: &Tensor, train: bool) -> Result<Tensor> {
        check_vector_pair(mol, prot, self.mol_emb_size, self.prot_emb_size)?;
        let mol_proj = self.mol_projector.forward_t(mol, train)?;
        let prot_proj = self.prot_projector.forward_t(prot, train)?;
        DistanceMetric::Cosine.compute(&mol_proj, &prot_proj)
    }

    fn architecture(&self) -> Architecture {
        Architecture::DeepCosine
    }

    fn latent_size(&self) -> Option<usize> {
        Some(self.mol_projector.out_dim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn inputs(batch: usize) -> (Tensor, Tensor) {
        let device = Device::Cpu;
        let mol = Tensor::randn(0f32, 1f32, (batch, 16), &device).unwrap();
        let prot = Tensor::randn(0f32, 1f32, (batch, 8), &device).unwrap();
        (mol, prot)
    }

    fn config(arch: Architecture) -> ModelConfig {
        ModelConfig::new(arch)
            .with_embedding_sizes(16, 8)
            .with_latent_size(12)
            .with_hidden_sizes(20, 8, 4)
    }

    #[test]
    fn test_simple_cosine_each_metric() {
        let (mol, prot) = inputs(5);
        for metric in DistanceMetric::ALL {
            let varmap = VarMap::new();
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
            let model = SimpleCosine::new(&config(Architecture::SimpleCosine).with_distance_metric(metric), vb).unwrap();
            assert_eq!(model.metric(), metric);
            let scores = model.forward(&mol, &prot).unwrap();
            assert_eq!(scores.dims(), &[5]);
        }
    }

    #[test]
    fn test_batch_norm_train_updates_running_stats() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = CosineBatchNorm::new(&config(Architecture::CosineBatchNorm), vb).unwrap();
        let (mol, prot) = inputs(6);

        let before = varmap.data().lock().unwrap()["mol_norm.running_mean"]
            .as_tensor()
            .to_vec1::<f32>()
            .unwrap();
        model.forward_t(&mol, &prot, true).unwrap();
        let after = varmap.data().lock().unwrap()["mol_norm.running_mean"]
            .as_tensor()
            .to_vec1::<f32>()
            .unwrap();
        assert_ne!(before, after);

        // Evaluation does not touch the statistics.
        model.forward(&mol, &prot).unwrap();
        let eval = varmap.data().lock().unwrap()["mol_norm.running_mean"]
            .as_tensor()
            .to_vec1::<f32>()
            .unwrap();
        assert_eq!(after, eval);
    }

    #[test]
    fn test_deep_cosine_dropout_only_in_training() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = DeepCosine::new(&config(Architecture::DeepCosine), vb).unwrap();
        let (mol, prot) = inputs(4);
        let a = model.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();
        let b = model.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(a, b);
        let t = model.forward_t(&mol, &prot, true).unwrap();
        assert_eq!(t.dims(), &[4]);
    }

    #[test]
    fn test_width_mismatch() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = SimpleCosine::new(&config(Architecture::SimpleCosine), vb).unwrap();
        let (_, prot) = inputs(2);
        let mol = Tensor::zeros((2, 15), DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(
            model.forward(&mol, &prot),
            Err(crate::AffinityError::ShapeMismatch(_))
        ));
    }
}
