use crate::config::FeatureConfig;
use crate::error::{EmbedError, EmbedResult};
use crate::features::patches::Patch;
use ndarray::{Array4, ArrayView3, Axis};

/// Patches stacked as `(N, mel, time, channel)`.
pub type Batch = Array4<f32>;

/// Stacks patches along a new leading axis, preserving their order.
///
/// No patches gives an empty `(0, mel, time, 1)` batch rather than an error.
pub fn assemble<I>(patches: I, config: &FeatureConfig) -> EmbedResult<Batch>
where
    I: IntoIterator<Item = Patch>,
{
    let patches: Vec<Patch> = patches.into_iter().collect();
    let (n_mels, n_frames, channels) = config.patch_shape();

    if patches.is_empty() {
        return Ok(Array4::zeros((0, n_mels, n_frames, channels)));
    }

    if let Some(bad) = patches.iter().find(|p| p.dim() != (n_mels, n_frames, channels)) {
        return Err(EmbedError::Inference(format!(
            "patch shape {:?} does not match {:?}",
            bad.dim(),
            (n_mels, n_frames, channels)
        )));
    }

    let views: Vec<ArrayView3<f32>> = patches.iter().map(|p| p.view()).collect();
    ndarray::stack(Axis(0), &views)
        .map_err(|e| EmbedError::Inference(format!("failed to stack patches: {}", e)))
}
