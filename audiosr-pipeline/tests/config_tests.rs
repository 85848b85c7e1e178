//! Configuration loading, overrides and validation
//!
//! Tests touching AUDIOSR_CONFIG run serially.

use audiosr_common::FadeCurve;
use audiosr_pipeline::config::{AudioSrConfig, ConfigOverrides, OracleKind, CONFIG_ENV_VAR};
use audiosr_pipeline::Error;
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_load_from_cli_path() {
    let file = write_config(
        r#"
        [pipeline]
        chunk_seconds = 5.12
        fade_curve = "s_curve"

        [generation]
        steps = 100

        [logging]
        level = "debug"
        "#,
    );

    let config = AudioSrConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.pipeline.chunk_seconds, 5.12);
    assert_eq!(config.pipeline.fade_curve, FadeCurve::SCurve);
    assert_eq!(config.pipeline.overlap, 0.04);
    assert_eq!(config.generation.steps, 100);
    assert_eq!(config.generation.guidance_scale, 3.5);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_load_from_env_var() {
    let file = write_config("[ensemble]\nenabled = true\ninput_cutoff = 8000\n");

    std::env::set_var(CONFIG_ENV_VAR, file.path());
    let loaded = AudioSrConfig::load(None);
    std::env::remove_var(CONFIG_ENV_VAR);

    let config = loaded.unwrap();
    assert!(config.ensemble.enabled);
    assert_eq!(config.planning_rate(), 16000);
    assert_eq!(config.crossover_frequency(), 7000.0);
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    let config = AudioSrConfig::load(Some(std::path::Path::new("/nonexistent/audiosr.toml"))).unwrap();
    assert_eq!(config, AudioSrConfig::default());
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    let file = write_config("[pipeline\nchunk_seconds = ");
    assert!(AudioSrConfig::load(Some(file.path())).is_err());
}

#[test]
fn test_overrides_beat_file_values() {
    let mut config = AudioSrConfig::from_toml_str(
        r#"
        [pipeline]
        chunk_seconds = 5.12
        overlap = 0.1

        [generation]
        seed = 7
        "#,
    )
    .unwrap();

    config.apply_overrides(&ConfigOverrides {
        overlap: Some(0.2),
        seed: Some(99),
        ensemble: Some(true),
        oracle_command: Some(PathBuf::from("/opt/sr/run")),
        ..Default::default()
    });

    assert_eq!(config.pipeline.chunk_seconds, 5.12);
    assert_eq!(config.pipeline.overlap, 0.2);
    assert_eq!(config.generation.seed, 99);
    assert_eq!(config.resolve_seed(), 99);
    assert!(config.ensemble.enabled);
    assert_eq!(config.oracle.kind, OracleKind::Command);
    assert_eq!(config.oracle.program, Some(PathBuf::from("/opt/sr/run")));
    assert!(config.validate().is_ok());
    assert!(config.build_oracle().is_ok());
}

#[test]
fn test_validation_rejects_unusable_values() {
    let cases = [
        "[pipeline]\nchunk_seconds = 0.0",
        "[pipeline]\noverlap = 1.0",
        "[pipeline]\noverlap = -0.1",
        "[generation]\nsteps = 0",
        "[ensemble]\nenabled = true\ninput_cutoff = 500",
        "[ensemble]\nenabled = true\nguard_frequency = 30000.0",
        "[ensemble]\ninput_cutoff = 4000000000",
        "[ensemble]\ninput_cutoff = 24001",
        "[oracle]\nkind = \"command\"",
    ];

    for case in cases {
        let config = AudioSrConfig::from_toml_str(case).unwrap();
        assert!(
            matches!(config.validate(), Err(Error::Config(_))),
            "accepted: {}",
            case
        );
    }
}

#[test]
fn test_planning_rate_for_large_cutoff() {
    let config = AudioSrConfig::from_toml_str("[ensemble]\ninput_cutoff = 4000000000").unwrap();
    assert_eq!(config.planning_rate(), u32::MAX);

    let config = AudioSrConfig::from_toml_str("[ensemble]\ninput_cutoff = 24000").unwrap();
    assert_eq!(config.planning_rate(), 48000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_ensemble_settings_only_when_enabled() {
    let mut config = AudioSrConfig::default();
    assert!(config.ensemble_settings().is_none());

    config.ensemble.enabled = true;
    let settings = config.ensemble_settings().unwrap();
    assert_eq!(settings.crossover_frequency, 11000.0);
    assert_eq!(settings.guard_frequency, 23000.0);
}

#[test]
fn test_generation_params_carry_seed() {
    let config = AudioSrConfig::default();
    let params = config.generation_params(1234);
    assert_eq!(params.seed, Some(1234));
    assert_eq!(params.steps, 50);
    assert_eq!(params.guidance_scale, 3.5);
}
