//! End-to-end pipeline tests with a stand-in inference engine.

mod common;

use common::{write_sine_wav, write_wav, StubEngine};
use msv2_inference::audio::{load_audio, Waveform};
use msv2_inference::features::{assemble, MelExtractor, Patch, PatchWindower};
use msv2_inference::{EmbedError, EmbeddingPipeline, FeatureConfig};
use std::sync::Arc;
use tempfile::TempDir;

fn pipeline() -> (Arc<StubEngine>, EmbeddingPipeline) {
    let engine = Arc::new(StubEngine::new());
    (engine.clone(), EmbeddingPipeline::new(engine))
}

#[test]
fn three_second_sine_gives_three_patches() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sine.wav");
    write_sine_wav(&path, 440.0, 48_000, 3 * 48_000);

    let (engine, pipeline) = pipeline();

    let waveform = load_audio(&path, 48_000).unwrap();
    let batch = pipeline.prepare(&waveform).unwrap();
    assert_eq!(batch.shape(), &[3, 128, 199, 1]);

    let embedding = pipeline.run(&path).unwrap();
    assert_eq!(embedding.len(), 512);
    assert_eq!(embedding.shape, vec![512]);
    assert!(embedding.embedding.iter().all(|v| v.is_finite()));
    assert_eq!(engine.batch_shapes(), vec![vec![3, 128, 199, 1]]);
}

#[test]
fn patch_count_follows_window_boundaries() {
    let (engine, pipeline) = pipeline();

    pipeline
        .embed_waveform(&Waveform::new(common::sine(440.0, 48_000, 48_000), 48_000))
        .unwrap();
    pipeline
        .embed_waveform(&Waveform::new(common::sine(440.0, 48_000, 48_001), 48_000))
        .unwrap();

    let shapes = engine.batch_shapes();
    assert_eq!(shapes[0][0], 1);
    assert_eq!(shapes[1][0], 2);
}

#[test]
fn empty_audio_gives_zero_embedding() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.wav");
    write_wav(&path, 48_000, 1, &[]);

    let (engine, pipeline) = pipeline();
    let embedding = pipeline.run(&path).unwrap();

    assert_eq!(embedding.shape, vec![512]);
    assert!(embedding.embedding.iter().all(|&v| v == 0.0));
    assert!(engine.batch_shapes().is_empty());
}

#[test]
fn same_bytes_same_embedding() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.wav");
    write_sine_wav(&path, 1234.0, 44_100, 100_000);

    let (_, pipeline) = pipeline();
    let first = pipeline.run(&path).unwrap();
    let second = pipeline.run(&path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn patch_order_does_not_change_the_embedding() {
    let config = FeatureConfig::OPENL3;
    let extractor = MelExtractor::new(config);

    // Three distinct seconds: different tones so the patches differ.
    let mut signal = common::sine(300.0, 48_000, 48_000);
    signal.extend(common::sine(2_000.0, 48_000, 48_000));
    signal.extend(common::sine(9_000.0, 48_000, 30_000));

    let patches: Vec<Patch> = PatchWindower::new(&extractor, &signal).collect();
    assert_eq!(patches.len(), 3);
    let mut shuffled = patches.clone();
    shuffled.rotate_left(1);
    shuffled.swap(0, 1);

    let (_, pipeline) = pipeline();
    let forward = pipeline
        .embed_batch(&assemble(patches, &config).unwrap())
        .unwrap();
    let permuted = pipeline
        .embed_batch(&assemble(shuffled, &config).unwrap())
        .unwrap();

    for (a, b) in forward.embedding.iter().zip(permuted.embedding.iter()) {
        assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
    }
}

#[test]
fn resampled_stereo_input_is_embedded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stereo.wav");
    let left = common::sine(440.0, 22_050, 22_050 * 2);
    let right = common::sine(660.0, 22_050, 22_050 * 2);
    let frames: Vec<Vec<f32>> = left.into_iter().zip(right).map(|(l, r)| vec![l, r]).collect();
    write_wav(&path, 22_050, 2, &frames);

    let (engine, pipeline) = pipeline();
    let embedding = pipeline.run(&path).unwrap();
    assert_eq!(embedding.len(), 512);
    assert_eq!(engine.batch_shapes(), vec![vec![2, 128, 199, 1]]);
}

#[test]
fn undecodable_file_is_a_decode_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.mp3");
    std::fs::write(&path, vec![0u8; 4096]).unwrap();

    let (_, pipeline) = pipeline();
    let err = pipeline.run(&path).unwrap_err();
    assert!(matches!(err, EmbedError::Decode(_)), "got {:?}", err);
}
