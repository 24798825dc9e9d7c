//! Runs decoding and feature extraction on a local file without a model and
//! prints what the model would be fed.
//!
//! Usage: verify_features <audio file>

use anyhow::{bail, Result};
use msv2_inference::audio::load_audio;
use msv2_inference::features::{Batch, MelExtractor, MelMode};
use msv2_inference::inference::InferenceEngine;
use msv2_inference::{EmbedError, EmbedResult, EmbeddingPipeline, FeatureConfig};
use ndarray::{Array2, Axis};
use std::path::Path;
use std::sync::Arc;

/// Stand-in so the pipeline can be built; never called.
struct NoModel;

impl InferenceEngine for NoModel {
    fn infer(&self, _batch: &Batch) -> EmbedResult<Array2<f32>> {
        Err(EmbedError::Inference("verify_features runs without a model".to_string()))
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: verify_features <audio file>");
        std::process::exit(2);
    }
    let audio_path = &args[1];
    if !Path::new(audio_path).exists() {
        bail!("Audio file not found at {}", audio_path);
    }

    let config = FeatureConfig::OPENL3;
    println!("Loading {}...", audio_path);
    let waveform = load_audio(audio_path, config.sample_rate)?;
    println!(
        "  {} samples @ {} Hz ({:.2}s)",
        waveform.len(),
        waveform.sample_rate,
        waveform.duration_seconds()
    );

    // Whole-signal spectrogram for a sanity check on absolute levels.
    let extractor = MelExtractor::new(config);
    let whole = extractor.extract(&waveform.signal, MelMode::WHOLE);
    if !whole.is_empty() {
        let max = whole.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let min = whole.fold(f32::INFINITY, |m, &v| m.min(v));
        println!(
            "Whole-signal mel: {:?}, range [{:.2}, {:.2}] dB",
            whole.dim(),
            min,
            max
        );
    }

    let pipeline = EmbeddingPipeline::new(Arc::new(NoModel));
    let batch = pipeline.prepare(&waveform)?;
    println!("Batch shape: {:?}", batch.shape());

    for (i, patch) in batch.axis_iter(Axis(0)).enumerate() {
        let max = patch.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let min = patch.fold(f32::INFINITY, |m, &v| m.min(v));
        let mean = patch.mean().unwrap_or(0.0);
        println!(
            "  patch {:>3}: max {:>7.2}  min {:>7.2}  mean {:>7.2}",
            i, max, min, mean
        );
        if max != 0.0 || min < -config.dynamic_range - 1e-3 {
            println!(">>> FAILURE: patch {} is outside [-{}, 0] dB", i, config.dynamic_range);
            std::process::exit(1);
        }
    }

    println!(">>> SUCCESS: {} patches ready for inference.", batch.shape()[0]);
    Ok(())
}
