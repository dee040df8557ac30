//! Behavioural properties shared by all architectures.

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use coembed_models::{
    build_model, seed_parameters, Activation, AffinityModel, AffinityScorer, Architecture, DistanceMetric,
    ModelConfig, ScorerConfig,
};

const MOL: usize = 24;
const PROT: usize = 10;

fn small_config(arch: Architecture) -> ModelConfig {
    ModelConfig::new(arch)
        .with_embedding_sizes(MOL, PROT)
        .with_latent_size(16)
        .with_hidden_sizes(32, 16, 8)
        .with_lstm(2, 6)
}

fn build(config: &ModelConfig, varmap: &VarMap) -> Box<dyn AffinityModel> {
    let vb = VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu);
    build_model(config, vb).unwrap()
}

fn inputs(arch: Architecture, batch: usize) -> (Tensor, Tensor) {
    let device = Device::Cpu;
    let mol = Tensor::randn(0f32, 1f32, (batch, MOL), &device).unwrap();
    let prot = if arch.is_sequence_model() {
        Tensor::randn(0f32, 1f32, (batch, 5, PROT), &device).unwrap()
    } else {
        Tensor::randn(0f32, 1f32, (batch, PROT), &device).unwrap()
    };
    (mol, prot)
}

#[test]
fn output_batch_matches_input_batch() {
    for arch in Architecture::ALL {
        let varmap = VarMap::new();
        let model = build(&small_config(arch), &varmap);
        for batch in [1, 3, 8] {
            let (mol, prot) = inputs(arch, batch);
            let scores = model.forward(&mol, &prot).unwrap();
            assert_eq!(scores.dims(), &[batch], "{arch} with batch {batch}");
        }
    }
}

#[test]
fn cosine_metrics_stay_in_range() {
    for (metric, lo, hi) in [
        (DistanceMetric::Cosine, -1.0f32, 1.0f32),
        (DistanceMetric::SquaredCosine, 0.0, 1.0),
    ] {
        for arch in [Architecture::SimpleCosine, Architecture::CosineBatchNorm] {
            let varmap = VarMap::new();
            let config = small_config(arch)
                .with_distance_metric(metric)
                .with_activation(Activation::Tanh);
            let model = build(&config, &varmap);
            let (mol, prot) = inputs(arch, 16);
            let scores = model.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();
            assert!(
                scores.iter().all(|s| *s >= lo - 1e-5 && *s <= hi + 1e-5),
                "{arch}/{metric}: {scores:?}"
            );
        }
    }

    for arch in [Architecture::LstmCosine, Architecture::DeepCosine] {
        let varmap = VarMap::new();
        let model = build(&small_config(arch), &varmap);
        let (mol, prot) = inputs(arch, 6);
        let scores = model.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();
        assert!(scores.iter().all(|s| s.abs() <= 1.0 + 1e-5), "{arch}: {scores:?}");
    }
}

#[test]
fn euclidean_metrics_are_non_negative() {
    for metric in [DistanceMetric::Euclidean, DistanceMetric::SquaredEuclidean] {
        let varmap = VarMap::new();
        let model = build(&small_config(Architecture::SimpleCosine).with_distance_metric(metric), &varmap);
        let (mol, prot) = inputs(Architecture::SimpleCosine, 7);
        let scores = model.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(scores.len(), 7);
        assert!(scores.iter().all(|s| *s >= 0.0));
    }
}

#[test]
fn sigmoid_heads_are_strictly_between_zero_and_one() {
    for arch in Architecture::ALL.into_iter().filter(|a| a.is_probability()) {
        let varmap = VarMap::new();
        let model = build(&small_config(arch), &varmap);
        let (mol, prot) = inputs(arch, 12);
        let scores = model.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();
        assert!(scores.iter().all(|s| *s > 0.0 && *s < 1.0), "{arch}: {scores:?}");
    }
}

#[test]
fn identity_projectors_score_symmetrically() {
    let device = Device::Cpu;
    let dim = 8;
    let config = ModelConfig::new(Architecture::SimpleCosine)
        .with_embedding_sizes(dim, dim)
        .with_latent_size(dim)
        .with_activation(Activation::Identity);
    let varmap = VarMap::new();
    let model = build(&config, &varmap);
    {
        let data = varmap.data().lock().unwrap();
        let eye = Tensor::eye(dim, DType::F32, &device).unwrap();
        let zero = Tensor::zeros(dim, DType::F32, &device).unwrap();
        for tower in ["mol_projector", "prot_projector"] {
            data[&format!("{tower}.0.weight")].set(&eye).unwrap();
            data[&format!("{tower}.0.bias")].set(&zero).unwrap();
        }
    }

    let a = Tensor::randn(0f32, 1f32, (5, dim), &device).unwrap();
    let b = Tensor::randn(0f32, 1f32, (5, dim), &device).unwrap();

    let same = model.forward(&a, &a).unwrap().to_vec1::<f32>().unwrap();
    assert!(same.iter().all(|s| (s - 1.0).abs() < 1e-5), "{same:?}");

    let ab = model.forward(&a, &b).unwrap().to_vec1::<f32>().unwrap();
    let ba = model.forward(&b, &a).unwrap().to_vec1::<f32>().unwrap();
    assert_eq!(ab, ba);
}

#[test]
fn repeated_forward_passes_are_bit_identical() {
    for arch in Architecture::ALL {
        let varmap = VarMap::new();
        let model = build(&small_config(arch), &varmap);
        let (mol, prot) = inputs(arch, 4);
        let first = model.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();
        let second = model.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(first, second, "{arch}");
    }
}

#[test]
fn same_seed_same_scores() {
    for arch in Architecture::ALL {
        let config = small_config(arch);
        let a = VarMap::new();
        let b = VarMap::new();
        let model_a = build(&config, &a);
        let model_b = build(&config, &b);
        seed_parameters(&a, 1234).unwrap();
        seed_parameters(&b, 1234).unwrap();

        let (mol, prot) = inputs(arch, 3);
        let sa = model_a.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();
        let sb = model_b.forward(&mol, &prot).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(sa, sb, "{arch}");
    }
}

#[test]
fn mismatched_batches_are_rejected() {
    for arch in Architecture::ALL {
        let varmap = VarMap::new();
        let model = build(&small_config(arch), &varmap);
        let (mol, _) = inputs(arch, 3);
        let (_, prot) = inputs(arch, 2);
        assert!(model.forward(&mol, &prot).is_err(), "{arch}");
    }
}

#[test]
fn default_simple_cosine_scores_four_pairs() {
    let scorer = tokio_test::block_on(AffinityScorer::new(
        ScorerConfig::cpu(ModelConfig::new(Architecture::SimpleCosine)).with_seed(0),
    ))
    .unwrap();

    let molecules: Vec<Vec<f32>> = (0..4)
        .map(|i| (0..2048).map(|j| ((i * 31 + j) % 7) as f32 / 7.0).collect())
        .collect();
    let proteins: Vec<Vec<f32>> = (0..4)
        .map(|i| (0..100).map(|j| ((i + j * 3) % 5) as f32 - 2.0).collect())
        .collect();

    let scores = scorer.score(&molecules, &proteins).unwrap();
    assert_eq!(scores.len(), 4);
    assert!(scores.iter().all(|s| (-1.0..=1.0).contains(s)), "{scores:?}");
}
