//! # Embedding Pipeline
//!
//! `run(audio_file)` chains the stages:
//!
//! 1. decode + resample to 48 kHz mono
//! 2. 1-second patches of log-mel energies
//! 3. stack into one batch
//! 4. inference (skipped for an empty batch)
//! 5. mean pooling
//!
//! The pipeline owns no mutable state; the inference engine is injected as a
//! shared handle so its load cost is paid once per process.

use crate::audio::{load_audio, Waveform};
use crate::config::FeatureConfig;
use crate::error::{EmbedError, EmbedResult};
use crate::features::{assemble, Batch, MelExtractor, PatchWindower};
use crate::inference::{mean_pool, InferenceEngine};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Pooled embedding and its shape, as returned to API clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embedding {
    pub embedding: Vec<f32>,
    pub shape: Vec<usize>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        let shape = vec![values.len()];
        Self {
            embedding: values,
            shape,
        }
    }

    pub fn zeros(dim: usize) -> Self {
        Self::new(vec![0.0; dim])
    }

    pub fn len(&self) -> usize {
        self.embedding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embedding.is_empty()
    }
}

pub struct EmbeddingPipeline {
    extractor: MelExtractor,
    engine: Arc<dyn InferenceEngine>,
}

impl EmbeddingPipeline {
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self::with_config(FeatureConfig::OPENL3, engine)
    }

    pub fn with_config(config: FeatureConfig, engine: Arc<dyn InferenceEngine>) -> Self {
        Self {
            extractor: MelExtractor::new(config),
            engine,
        }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.extractor.config
    }

    /// Decodes `audio_path` and embeds it.
    pub fn run<P: AsRef<Path>>(&self, audio_path: P) -> EmbedResult<Embedding> {
        let waveform = load_audio(audio_path.as_ref(), self.config().sample_rate)?;
        debug!(
            "decoded {} ({:.2}s)",
            audio_path.as_ref().display(),
            waveform.duration_seconds()
        );
        self.embed_waveform(&waveform)
    }

    /// Stages 2-5 on an already decoded waveform.
    pub fn embed_waveform(&self, waveform: &Waveform) -> EmbedResult<Embedding> {
        let batch = self.prepare(waveform)?;
        self.embed_batch(&batch)
    }

    /// Stages 2-3: patches stacked into a batch.
    pub fn prepare(&self, waveform: &Waveform) -> EmbedResult<Batch> {
        let config = self.config();
        if waveform.sample_rate != config.sample_rate {
            return Err(EmbedError::Decode(format!(
                "waveform is {} Hz, features need {} Hz",
                waveform.sample_rate, config.sample_rate
            )));
        }
        let patches = PatchWindower::new(&self.extractor, &waveform.signal);
        assemble(patches, config)
    }

    /// Stages 4-5: inference and pooling.
    pub fn embed_batch(&self, batch: &Batch) -> EmbedResult<Embedding> {
        let dim = self.config().embedding_dim;
        let n_patches = batch.shape()[0];
        if n_patches == 0 {
            return Ok(Embedding::zeros(dim));
        }

        let outputs = self.engine.infer(batch)?;
        if outputs.nrows() != n_patches {
            return Err(EmbedError::Inference(format!(
                "engine returned {} rows for {} patches",
                outputs.nrows(),
                n_patches
            )));
        }
        debug!("inference on {} patches -> {:?}", n_patches, outputs.dim());

        Ok(Embedding::new(mean_pool(&outputs, dim)))
    }
}
