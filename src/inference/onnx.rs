use crate::config::FeatureConfig;
use crate::error::{EmbedError, EmbedResult};
use crate::features::Batch;
use crate::inference::InferenceEngine;
use anyhow::{anyhow, Context, Result};
use ndarray::Array2;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// ONNX Runtime session holding the embedding model.
///
/// `Session::run` needs exclusive access, so the session sits behind a mutex:
/// concurrent requests queue for the model instead of sharing it.
pub struct OnnxEngine {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    patch_shape: [usize; 3],
}

impl OnnxEngine {
    /// Loads the model. The first graph input and output are used.
    pub fn new<P: AsRef<Path>>(model_path: P, use_gpu: bool, config: &FeatureConfig) -> Result<Self> {
        let model_path = model_path.as_ref();

        let builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?;
        let builder = configure_provider(builder, use_gpu)?;
        let session = builder
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load ONNX model {}", model_path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| anyhow!("model has no inputs"))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| anyhow!("model has no outputs"))?;

        info!(
            "ONNX Runtime session ready ({}), input '{}', output '{}'",
            if use_gpu { "gpu requested" } else { "cpu" },
            input_name,
            output_name
        );

        let (n_mels, n_frames, channels) = config.patch_shape();
        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            patch_shape: [n_mels, n_frames, channels],
        })
    }
}

#[cfg(feature = "cuda")]
fn configure_provider(
    builder: ort::session::builder::SessionBuilder,
    use_gpu: bool,
) -> Result<ort::session::builder::SessionBuilder> {
    use ort::execution_providers::CUDAExecutionProvider;

    if !use_gpu {
        return Ok(builder);
    }
    // Falls back to CPU inside ONNX Runtime when CUDA is unavailable.
    Ok(builder.with_execution_providers([CUDAExecutionProvider::default().build()])?)
}

#[cfg(not(feature = "cuda"))]
fn configure_provider(
    builder: ort::session::builder::SessionBuilder,
    use_gpu: bool,
) -> Result<ort::session::builder::SessionBuilder> {
    if use_gpu {
        tracing::warn!("USE_GPU set but built without the `cuda` feature; using CPU");
    }
    Ok(builder)
}

impl InferenceEngine for OnnxEngine {
    fn infer(&self, batch: &Batch) -> EmbedResult<Array2<f32>> {
        let shape = batch.shape();
        if shape[1..] != self.patch_shape {
            return Err(EmbedError::Inference(format!(
                "batch shape {:?} does not match model input [N, {}, {}, {}]",
                shape, self.patch_shape[0], self.patch_shape[1], self.patch_shape[2]
            )));
        }
        let n_patches = shape[0];

        let input_value = Value::from_array(batch.as_standard_layout().into_owned())
            .map_err(|e| EmbedError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| EmbedError::Inference("model session poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .map_err(|e| EmbedError::Inference(e.to_string()))?;

        let (out_shape, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedError::Inference(e.to_string()))?;
        let dims: Vec<usize> = out_shape.iter().map(|&x| x as usize).collect();
        debug!("inference output shape {:?}", dims);

        // One row per patch; anything after the batch axis is the embedding.
        if dims.len() < 2 || dims[0] != n_patches {
            return Err(EmbedError::Inference(format!(
                "unexpected output shape {:?} for {} patches",
                dims, n_patches
            )));
        }
        let width: usize = dims[1..].iter().product();

        Array2::from_shape_vec((n_patches, width), data.to_vec())
            .map_err(|e| EmbedError::Inference(e.to_string()))
    }
}
