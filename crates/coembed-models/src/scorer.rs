//! Affinity scorer: owns a model's parameters and scores embedding pairs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use tracing::{debug, info, warn};

use crate::batch::{chunk_slice, rows_to_tensor, sequences_to_tensor};
use crate::init::seed_parameters;
use crate::{build_model, AffinityError, AffinityModel, Architecture, Result, ScorerConfig};

/// Molecule-protein affinity scorer.
///
/// Builds the configured architecture on a fresh parameter map, optionally
/// seeds it and loads a safetensors checkpoint, then scores batches in
/// evaluation mode.
pub struct AffinityScorer {
    model: Box<dyn AffinityModel>,
    varmap: VarMap,
    device: Device,
    config: ScorerConfig,
}

impl AffinityScorer {
    /// Create a scorer from configuration.
    pub async fn new(config: ScorerConfig) -> Result<Self> {
        let start = Instant::now();
        config.validate()?;
        info!("Building {} scorer", config.model.architecture);

        let device = Self::select_device(&config)?;
        debug!("Using device: {:?}", device);

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = build_model(&config.model, vb)?;

        if let Some(seed) = config.seed {
            seed_parameters(&varmap, seed)?;
        }

        let mut scorer = Self {
            model,
            varmap,
            device,
            config,
        };

        if let Some(path) = scorer.config.checkpoint.clone() {
            scorer.load_checkpoint(path).await?;
        }

        info!(
            "{} ready with {} parameters in {:.2}s",
            scorer.architecture(),
            scorer.parameter_count(),
            start.elapsed().as_secs_f32()
        );
        Ok(scorer)
    }

    /// CPU unless a GPU was requested; an unusable GPU degrades to CPU.
    fn select_device(config: &ScorerConfig) -> Result<Device> {
        if !config.use_gpu {
            return Ok(Device::Cpu);
        }
        match gpu_device() {
            Ok(device) => Ok(device),
            Err(e) => {
                warn!("{}; scoring on CPU", e);
                Ok(Device::Cpu)
            }
        }
    }

    /// Load parameters from a safetensors checkpoint.
    ///
    /// Every parameter of the model must be present with a matching shape;
    /// extra tensors in the file are ignored.
    pub async fn load_checkpoint(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let start = Instant::now();
        info!("Loading checkpoint {:?}", path);

        let read_path = path.clone();
        let bytes = tokio::task::spawn_blocking(move || std::fs::read(read_path))
            .await
            .map_err(|e| AffinityError::Checkpoint(e.to_string()))??;
        let tensors = candle_core::safetensors::load_buffer(&bytes, &self.device)
            .map_err(|e| AffinityError::Checkpoint(format!("{}: {}", path.display(), e)))?;

        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|e| AffinityError::Checkpoint(format!("parameter map poisoned: {e}")))?;
        let mut names: Vec<&String> = data.keys().collect();
        names.sort();

        // Resolve every parameter before touching any of them.
        let mut updates = Vec::with_capacity(names.len());
        for name in names {
            let var = &data[name];
            let tensor = tensors.get(name).ok_or_else(|| {
                AffinityError::Checkpoint(format!("{} is missing parameter {}", path.display(), name))
            })?;
            if tensor.dims() != var.dims() {
                return Err(AffinityError::Checkpoint(format!(
                    "parameter {} has shape {:?} in checkpoint, model expects {:?}",
                    name,
                    tensor.dims(),
                    var.dims()
                )));
            }
            updates.push((var, tensor.to_dtype(var.dtype())?));
        }
        for (var, tensor) in &updates {
            var.set(tensor)?;
        }

        info!("Loaded {} tensors in {:.2}ms", data.len(), start.elapsed().as_secs_f32() * 1000.0);
        Ok(())
    }

    /// Save parameters as safetensors.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.varmap
            .save(path)
            .map_err(|e| AffinityError::Checkpoint(format!("{}: {}", path.display(), e)))?;
        info!("Saved checkpoint to {:?}", path);
        Ok(())
    }

    /// Evaluation-mode forward pass over tensors already on this device.
    pub fn forward(&self, mol: &Tensor, prot: &Tensor) -> Result<Tensor> {
        self.model.forward(mol, prot)
    }

    /// Score fixed-width molecule/protein embedding pairs.
    pub fn score(&self, molecules: &[Vec<f32>], proteins: &[Vec<f32>]) -> Result<Vec<f32>> {
        if self.architecture().is_sequence_model() {
            return Err(AffinityError::InvalidInput(format!(
                "{} expects per-residue protein sequences; use score_sequences",
                self.architecture()
            )));
        }
        check_pair_count(molecules.len(), proteins.len())?;

        let start = Instant::now();
        let model = &self.config.model;
        let mut scores = Vec::with_capacity(molecules.len());
        for (mol_chunk, prot_chunk) in chunk_slice(molecules, self.config.batch_size)
            .into_iter()
            .zip(chunk_slice(proteins, self.config.batch_size))
        {
            let mol = rows_to_tensor(mol_chunk, model.mol_emb_size, &self.device)?;
            let prot = rows_to_tensor(prot_chunk, model.prot_emb_size, &self.device)?;
            scores.extend(self.forward(&mol, &prot)?.to_vec1::<f32>()?);
        }

        log_throughput(scores.len(), start);
        Ok(scores)
    }

    /// Score molecules against per-residue protein sequences.
    ///
    /// Each chunk of `batch_size` pairs is zero-padded to its longest
    /// sequence and the padding runs through the LSTM, so a pair's score
    /// depends on the sequences it shares a chunk with. Use a `batch_size`
    /// of 1, or group sequences of equal length, for padding-free scores.
    pub fn score_sequences(&self, molecules: &[Vec<f32>], sequences: &[Vec<Vec<f32>>]) -> Result<Vec<f32>> {
        if !self.architecture().is_sequence_model() {
            return Err(AffinityError::InvalidInput(format!(
                "{} expects fixed-width protein embeddings; use score",
                self.architecture()
            )));
        }
        check_pair_count(molecules.len(), sequences.len())?;

        let start = Instant::now();
        let model = &self.config.model;
        let mut scores = Vec::with_capacity(molecules.len());
        for (mol_chunk, seq_chunk) in chunk_slice(molecules, self.config.batch_size)
            .into_iter()
            .zip(chunk_slice(sequences, self.config.batch_size))
        {
            let mol = rows_to_tensor(mol_chunk, model.mol_emb_size, &self.device)?;
            let (prot, _lengths) = sequences_to_tensor(seq_chunk, model.prot_emb_size, &self.device)?;
            scores.extend(self.forward(&mol, &prot)?.to_vec1::<f32>()?);
        }

        log_throughput(scores.len(), start);
        Ok(scores)
    }

    /// Number of scalar parameters, batch-norm statistics included.
    pub fn parameter_count(&self) -> usize {
        self.varmap.all_vars().iter().map(|v| v.elem_count()).sum()
    }

    pub fn architecture(&self) -> Architecture {
        self.model.architecture()
    }

    pub fn model(&self) -> &dyn AffinityModel {
        self.model.as_ref()
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Check if GPU is being used.
    pub fn is_gpu(&self) -> bool {
        matches!(self.device, Device::Cuda(_) | Device::Metal(_))
    }
}

/// First CUDA or Metal device compiled in and present.
fn gpu_device() -> Result<Device> {
    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Scoring on CUDA device 0");
                return Ok(device);
            }
            Err(e) => debug!("CUDA device 0 unusable: {}", e),
        }
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Scoring on Metal device 0");
                return Ok(device);
            }
            Err(e) => debug!("Metal device 0 unusable: {}", e),
        }
    }

    Err(AffinityError::Device(
        "no usable GPU (needs the cuda or metal feature and a matching device)".to_string(),
    ))
}

fn check_pair_count(molecules: usize, proteins: usize) -> Result<()> {
    if molecules != proteins {
        return Err(AffinityError::InvalidInput(format!(
            "{molecules} molecules but {proteins} proteins"
        )));
    }
    Ok(())
}

fn log_throughput(n: usize, start: Instant) {
    let secs = start.elapsed().as_secs_f32();
    debug!(
        "Scored {} pairs in {:.2}ms ({:.2} pairs/sec)",
        n,
        secs * 1000.0,
        n as f32 / secs.max(f32::EPSILON)
    );
}
