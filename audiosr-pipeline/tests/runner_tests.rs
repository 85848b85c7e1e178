//! End-to-end file processing tests with the built-in resample oracle

mod helpers;

use audiosr_pipeline::config::AudioSrConfig;
use audiosr_pipeline::runner::run_file;
use audiosr_pipeline::Error;
use helpers::write_sine_wav;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn test_config(ensemble: bool) -> AudioSrConfig {
    let toml = format!(
        r#"
        [pipeline]
        chunk_seconds = 1.0
        overlap = 0.1

        [generation]
        seed = 42

        [ensemble]
        enabled = {}
        "#,
        ensemble
    );
    AudioSrConfig::from_toml_str(&toml).unwrap()
}

fn not_cancelled() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

#[test]
fn test_stereo_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("take.wav");
    write_sine_wav(&input, 2, 44100, 2000, 440.0, 0.5).unwrap();

    let out_dir = dir.path().join("out");
    let outcome = run_file(&test_config(false), &input, Some(&out_dir), not_cancelled()).unwrap();

    assert_eq!(outcome.output_path, out_dir.join("SR_take.wav"));
    assert_eq!(outcome.seed, 42);
    assert_eq!(outcome.channels, 2);
    assert_eq!(outcome.sample_rate, 48000);
    assert_eq!(outcome.chunks_per_channel, 3);
    // Each channel's last chunk keeps 0.2 s, shorter than one gating block
    assert_eq!(outcome.unmatched_chunks, 2);

    let reader = hound::WavReader::open(&outcome.output_path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 48000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    assert_eq!(reader.duration(), 96_000);
    assert_eq!(outcome.frames, 96_000);
}

#[test]
fn test_ensemble_output_matches_reference_length() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("short.wav");
    // 1.5 s at 44.1 kHz: reference at 48 kHz has 72000 frames
    write_sine_wav(&input, 1, 44100, 1500, 1000.0, 0.5).unwrap();

    let outcome = run_file(&test_config(true), &input, None, not_cancelled()).unwrap();
    assert_eq!(outcome.output_path, dir.path().join("SR_short.wav"));
    assert_eq!(outcome.frames, 72_000);

    let reader = hound::WavReader::open(&outcome.output_path).unwrap();
    assert_eq!(reader.duration(), 72_000);
    assert_eq!(reader.spec().channels, 1);
}

#[test]
fn test_missing_input_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("missing.wav");

    let result = run_file(&test_config(false), &input, None, not_cancelled());
    assert!(result.is_err());
    assert!(!dir.path().join("SR_missing.wav").exists());
}

#[test]
fn test_cancelled_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("take.wav");
    write_sine_wav(&input, 1, 44100, 1000, 440.0, 0.5).unwrap();

    let cancel = Arc::new(AtomicBool::new(true));
    let result = run_file(&test_config(false), &input, None, cancel);
    assert!(matches!(result, Err(Error::Cancelled { chunk: 0, .. })));
    assert!(!dir.path().join("SR_take.wav").exists());
}

#[test]
fn test_invalid_config_rejected_before_decoding() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("missing.wav");

    let mut config = test_config(false);
    config.pipeline.overlap = 1.0;
    let result = run_file(&config, &input, None, not_cancelled());
    assert!(matches!(result, Err(Error::Config(_))));
}
