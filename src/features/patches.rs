use crate::features::mel::{MelExtractor, MelMode};
use ndarray::{s, Array3};

/// One network-ready window: `(mel band, time frame, channel)`.
pub type Patch = Array3<f32>;

/// Lazy iterator over the 1-second patches of a waveform, in temporal order.
///
/// The final window is zero-padded on the right, so a signal one sample past a
/// window boundary still produces a full extra patch.
pub struct PatchWindower<'a> {
    extractor: &'a MelExtractor,
    signal: &'a [f32],
    offset: usize,
}

impl<'a> PatchWindower<'a> {
    pub fn new(extractor: &'a MelExtractor, signal: &'a [f32]) -> Self {
        Self {
            extractor,
            signal,
            offset: 0,
        }
    }

    fn remaining(&self) -> usize {
        let hop = self.extractor.config.patch_hop;
        let left = self.signal.len().saturating_sub(self.offset);
        left.div_ceil(hop)
    }

    fn make_patch(&self, offset: usize) -> Patch {
        let cfg = &self.extractor.config;
        let end = (offset + cfg.patch_samples).min(self.signal.len());

        let mut chunk = vec![0.0f32; cfg.patch_samples];
        chunk[..end - offset].copy_from_slice(&self.signal[offset..end]);

        let mel = self.extractor.extract(&chunk, MelMode::PATCH);

        // Crop or zero-pad time to the fixed frame count, then put mel bands first.
        let (n_mels, n_frames, channels) = cfg.patch_shape();
        let mut patch = Array3::<f32>::zeros((n_mels, n_frames, channels));
        let keep = mel.nrows().min(n_frames);
        patch
            .slice_mut(s![.., ..keep, 0])
            .assign(&mel.slice(s![..keep, ..]).t());
        patch
    }
}

impl Iterator for PatchWindower<'_> {
    type Item = Patch;

    fn next(&mut self) -> Option<Patch> {
        if self.offset >= self.signal.len() {
            return None;
        }
        let patch = self.make_patch(self.offset);
        self.offset += self.extractor.config.patch_hop;
        Some(patch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for PatchWindower<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use std::f32::consts::PI;

    fn noise(n: usize) -> Vec<f32> {
        // Deterministic broadband signal.
        (0..n)
            .map(|i| {
                let x = i as f32;
                0.3 * (2.0 * PI * 313.0 * x / 48_000.0).sin()
                    + 0.2 * (2.0 * PI * 2711.0 * x / 48_000.0).sin()
                    + 0.1 * (2.0 * PI * 9133.0 * x / 48_000.0).sin()
            })
            .collect()
    }

    #[test]
    fn empty_signal_has_no_patches() {
        let ex = MelExtractor::new(FeatureConfig::OPENL3);
        let mut patches = PatchWindower::new(&ex, &[]);
        assert_eq!(patches.len(), 0);
        assert!(patches.next().is_none());
    }

    #[test]
    fn exact_window_gives_one_patch() {
        let ex = MelExtractor::new(FeatureConfig::OPENL3);
        let signal = noise(48_000);
        assert_eq!(PatchWindower::new(&ex, &signal).count(), 1);
    }

    #[test]
    fn one_extra_sample_gives_a_second_patch() {
        let ex = MelExtractor::new(FeatureConfig::OPENL3);
        let signal = noise(48_001);
        let windower = PatchWindower::new(&ex, &signal);
        assert_eq!(windower.len(), 2);

        let patches: Vec<Patch> = windower.collect();
        assert_eq!(patches.len(), 2);

        // The second window holds one real sample and zeros; after peak
        // normalization it is essentially flat.
        let second = &patches[1];
        assert!(second.iter().all(|&v| v <= 0.0));
    }

    #[test]
    fn patch_shape_and_padding() {
        let ex = MelExtractor::new(FeatureConfig::OPENL3);
        let signal = noise(48_000);
        let patch = PatchWindower::new(&ex, &signal).next().unwrap();

        assert_eq!(patch.dim(), (128, 199, 1));

        // 190 real frames, the rest are zero rows.
        assert!(patch.slice(s![.., 190.., 0]).iter().all(|&v| v == 0.0));
        assert!(patch.slice(s![.., ..190, 0]).iter().any(|&v| v < 0.0));
    }

    #[test]
    fn patch_values_are_peak_normalized() {
        let ex = MelExtractor::new(FeatureConfig::OPENL3);
        let signal = noise(3 * 48_000);
        for patch in PatchWindower::new(&ex, &signal) {
            let max = patch.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
            let min = patch.fold(f32::INFINITY, |m, &v| m.min(v));
            assert_eq!(max, 0.0);
            assert!(min >= -80.0 - 1e-3);
        }
    }

    #[test]
    fn windows_are_independent() {
        let ex = MelExtractor::new(FeatureConfig::OPENL3);
        let mut signal = noise(2 * 48_000);
        let before: Vec<Patch> = PatchWindower::new(&ex, &signal).collect();

        // Changing the second second must not touch the first patch.
        for s in signal[48_000..].iter_mut() {
            *s *= 0.1;
        }
        let after: Vec<Patch> = PatchWindower::new(&ex, &signal).collect();
        assert_eq!(before[0], after[0]);
    }
}
