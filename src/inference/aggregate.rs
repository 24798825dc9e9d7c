use ndarray::{Array2, Axis};

/// Averages per-patch outputs into one vector.
///
/// An empty matrix pools to a zero vector of length `dim`.
pub fn mean_pool(outputs: &Array2<f32>, dim: usize) -> Vec<f32> {
    match outputs.mean_axis(Axis(0)) {
        Some(mean) if outputs.nrows() > 0 => mean.to_vec(),
        _ => vec![0.0; dim],
    }
}
