//! Shared fixtures: WAV writers and a deterministic stand-in for the model.

#![allow(dead_code)]

use msv2_inference::features::Batch;
use msv2_inference::inference::InferenceEngine;
use msv2_inference::EmbedResult;
use ndarray::{Array2, Axis};
use std::f32::consts::PI;
use std::path::Path;
use std::sync::Mutex;

/// Writes 32-bit float PCM. `frames[i]` holds one sample per channel.
pub fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: &[Vec<f32>]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for frame in frames {
        for &s in frame {
            writer.write_sample(s).unwrap();
        }
    }
    writer.finalize().unwrap();
}

pub fn sine(freq: f32, sample_rate: u32, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Mono WAV of a sine tone.
pub fn write_sine_wav(path: &Path, freq: f32, sample_rate: u32, n: usize) {
    let frames: Vec<Vec<f32>> = sine(freq, sample_rate, n).into_iter().map(|s| vec![s]).collect();
    write_wav(path, sample_rate, 1, &frames);
}

/// Maps each patch to a 512-vector built from its per-band mean levels and
/// remembers the batch shapes it saw.
pub struct StubEngine {
    pub seen: Mutex<Vec<Vec<usize>>>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn batch_shapes(&self) -> Vec<Vec<usize>> {
        self.seen.lock().unwrap().clone()
    }
}

impl InferenceEngine for StubEngine {
    fn infer(&self, batch: &Batch) -> EmbedResult<Array2<f32>> {
        self.seen.lock().unwrap().push(batch.shape().to_vec());

        let n = batch.shape()[0];
        let n_mels = batch.shape()[1];
        let mut out = Array2::<f32>::zeros((n, 512));
        for (i, patch) in batch.axis_iter(Axis(0)).enumerate() {
            for j in 0..512 {
                let band = patch.index_axis(Axis(0), j % n_mels);
                let level = band.mean().unwrap_or(0.0);
                out[[i, j]] = level + 0.001 * (j / n_mels) as f32;
            }
        }
        Ok(out)
    }
}
