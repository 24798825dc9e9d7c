//! # Feature Configuration
//!
//! The constants in [`FeatureConfig::OPENL3`] mirror the preprocessing the
//! embedding model was trained with. They are part of the contract between
//! feature extraction and the model: changing any one of them silently changes
//! what an embedding means, so they are not exposed as runtime settings.

use serde::Serialize;

/// Fixed numeric parameters shared by every pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureConfig {
    /// Waveform sample rate in Hz.
    pub sample_rate: u32,
    /// Number of mel bands.
    pub n_mels: usize,
    /// STFT frame size (and FFT length) in samples.
    pub n_fft: usize,
    /// STFT hop in samples.
    pub hop_length: usize,
    /// Lowest filter-bank frequency in Hz.
    pub f_min: f64,
    /// Samples per analysis window.
    pub patch_samples: usize,
    /// Samples between the starts of consecutive windows.
    pub patch_hop: usize,
    /// Time frames per patch after crop/pad.
    pub patch_frames: usize,
    /// Floor applied before taking the logarithm.
    pub amin: f32,
    /// Reference level subtracted in dB.
    pub db_ref: f32,
    /// Values more than this many dB below the peak are clipped.
    pub dynamic_range: f32,
    /// Length of the output embedding.
    pub embedding_dim: usize,
}

impl FeatureConfig {
    /// OpenL3 mel-128 preprocessing.
    pub const OPENL3: FeatureConfig = FeatureConfig {
        sample_rate: 48_000,
        n_mels: 128,
        n_fft: 2048,
        hop_length: 242,
        f_min: 0.0,
        patch_samples: 48_000,
        patch_hop: 48_000,
        patch_frames: 199,
        amin: 1e-10,
        db_ref: 1.0,
        dynamic_range: 80.0,
        embedding_dim: 512,
    };

    /// Upper filter-bank frequency: always Nyquist.
    pub fn f_max(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    /// Number of unique FFT bins (`n_fft / 2 + 1`).
    pub fn n_freqs(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Shape of one patch: `(mel, time, channel)`.
    pub fn patch_shape(&self) -> (usize, usize, usize) {
        (self.n_mels, self.patch_frames, 1)
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self::OPENL3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openl3_constants() {
        let cfg = FeatureConfig::OPENL3;
        assert_eq!(cfg.sample_rate, 48_000);
        assert_eq!(cfg.n_mels, 128);
        assert_eq!(cfg.n_fft, 2048);
        assert_eq!(cfg.hop_length, 242);
        assert_eq!(cfg.patch_samples, 48_000);
        assert_eq!(cfg.patch_hop, cfg.patch_samples);
        assert_eq!(cfg.patch_frames, 199);
        assert_eq!(cfg.amin, 1e-10);
        assert_eq!(cfg.db_ref, 1.0);
        assert_eq!(cfg.dynamic_range, 80.0);
        assert_eq!(cfg.embedding_dim, 512);
    }

    #[test]
    fn derived_values() {
        let cfg = FeatureConfig::default();
        assert_eq!(cfg.f_max(), 24_000.0);
        assert_eq!(cfg.n_freqs(), 1025);
        assert_eq!(cfg.patch_shape(), (128, 199, 1));
    }
}
