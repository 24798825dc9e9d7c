use crate::config::FeatureConfig;
use crate::features::filterbank::slaney_filter_bank;
use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Log-mel energies laid out as `(time frame, mel band)`.
pub type MelSpectrogram = Array2<f32>;

/// How a segment is framed and normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MelMode {
    /// Zero-pad `n_fft / 2` samples on both edges so frames are centered on hop boundaries.
    pub center: bool,
    /// Subtract the segment's own peak after clipping, pinning its maximum to 0 dB.
    pub peak_normalize: bool,
}

impl MelMode {
    /// One patch window: first frame starts at sample 0, peak pinned to 0 dB.
    pub const PATCH: MelMode = MelMode {
        center: false,
        peak_normalize: true,
    };

    /// A whole signal: centered frames, absolute dB levels kept.
    pub const WHOLE: MelMode = MelMode {
        center: true,
        peak_normalize: false,
    };
}

/// STFT + mel filter bank + log compression with fixed parameters.
///
/// The FFT plan, Hann window and filter bank are built once and only read
/// afterwards, so one extractor can be shared across threads.
pub struct MelExtractor {
    pub config: FeatureConfig,
    window: Vec<f32>,
    filterbank: Array2<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl MelExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        let n_fft = config.n_fft;

        // Periodic Hann, as used for spectral analysis.
        let window: Vec<f32> = (0..n_fft)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n_fft as f32).cos())
            .collect();

        let filterbank = slaney_filter_bank(
            config.n_mels,
            n_fft,
            config.sample_rate,
            config.f_min,
            config.f_max(),
        );

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n_fft);

        Self {
            config,
            window,
            filterbank,
            fft,
        }
    }

    /// Computes the log-mel spectrogram of `segment`.
    ///
    /// Returns `(frames, n_mels)`; `frames` is zero when the segment is shorter
    /// than one FFT frame and `mode.center` is off.
    pub fn extract(&self, segment: &[f32], mode: MelMode) -> MelSpectrogram {
        let magnitudes = self.magnitude_spectrogram(segment, mode.center);

        // (frames, bins) x (bins, mels) -> (frames, mels)
        let mut mel = magnitudes.dot(&self.filterbank);
        self.log_compress(&mut mel, mode.peak_normalize);
        mel
    }

    /// Magnitude STFT as `(frames, n_fft / 2 + 1)`.
    fn magnitude_spectrogram(&self, segment: &[f32], center: bool) -> Array2<f32> {
        let n_fft = self.config.n_fft;
        let hop = self.config.hop_length;
        let n_freqs = self.config.n_freqs();

        let padded: Vec<f32>;
        let signal: &[f32] = if center {
            let pad = n_fft / 2;
            let mut buf = vec![0.0f32; segment.len() + 2 * pad];
            buf[pad..pad + segment.len()].copy_from_slice(segment);
            padded = buf;
            &padded
        } else {
            segment
        };

        if signal.len() < n_fft {
            return Array2::zeros((0, n_freqs));
        }
        let n_frames = 1 + (signal.len() - n_fft) / hop;

        let mut spec = Array2::<f32>::zeros((n_frames, n_freqs));
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];

        for t in 0..n_frames {
            let frame = &signal[t * hop..t * hop + n_fft];
            for ((slot, &s), &w) in buffer.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new(s * w, 0.0);
            }
            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (k, value) in buffer.iter().take(n_freqs).enumerate() {
                spec[[t, k]] = value.norm();
            }
        }

        spec
    }

    /// dB conversion, reference shift and dynamic-range clip, optionally
    /// followed by peak normalization.
    fn log_compress(&self, mel: &mut MelSpectrogram, peak_normalize: bool) {
        if mel.is_empty() {
            return;
        }
        let amin = self.config.amin;

        // 1. power -> dB with a floor
        mel.mapv_inplace(|v| 10.0 * v.max(amin).log10());

        // 2. reference level
        let ref_db = 10.0 * self.config.db_ref.max(amin).log10();
        mel.mapv_inplace(|v| v - ref_db);

        // 3. dynamic range
        let peak = mel.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let floor = peak - self.config.dynamic_range;
        mel.mapv_inplace(|v| v.max(floor));

        if peak_normalize {
            mel.mapv_inplace(|v| v - peak);
        }
    }
}
