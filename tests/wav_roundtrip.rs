mod common;

use common::*;
use vocalshift::io::{read_wav_file, write_wav_file, WavEncoding};
use vocalshift::{render, render_wav_file, EngineConfig, ParamSnapshot, VocalError};

#[test]
fn float_file_round_trip_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let samples = gen_sine(440.0, 48_000, 4800, 0.7);

    write_wav_file(&path, &samples, 48_000, WavEncoding::Float32).unwrap();
    let audio = read_wav_file(&path).unwrap();
    assert_eq!(audio.sample_rate, 48_000);
    assert_eq!(audio.source_channels, 1);
    assert_eq!(audio.samples, samples);
    assert!((audio.duration_secs() - 0.1).abs() < 1e-9);
}

#[test]
fn pcm16_file_round_trip_within_quantization() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone16.wav");
    let samples = gen_sine(440.0, SR, 4410, 0.9);

    write_wav_file(&path, &samples, SR, WavEncoding::Pcm16).unwrap();
    let audio = read_wav_file(&path).unwrap();
    assert_eq!(audio.samples.len(), samples.len());
    for (i, (a, b)) in audio.samples.iter().zip(&samples).enumerate() {
        assert!((a - b).abs() < 1.0 / 16384.0, "sample {}: {} vs {}", i, a, b);
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_wav_file(dir.path().join("nope.wav")).unwrap_err();
    assert!(matches!(err, VocalError::IoError(ref m) if m.contains("nope.wav")), "{:?}", err);
}

#[test]
fn render_wav_file_matches_in_memory_render() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("in.wav");
    let output_path = dir.path().join("out.wav");
    let samples = gen_harmonic(210.0, SR, 30_000, 4);
    write_wav_file(&input_path, &samples, SR, WavEncoding::Float32).unwrap();

    let params = ParamSnapshot {
        correction_amount: 1.0,
        correction_speed: 0.0,
        ..ParamSnapshot::default()
    };
    render_wav_file(
        input_path.to_str().unwrap(),
        output_path.to_str().unwrap(),
        &params,
        WavEncoding::Float32,
    )
    .unwrap();

    let rendered = read_wav_file(&output_path).unwrap();
    let expected = render(&samples, &EngineConfig::new(SR), &params, 512).unwrap();
    assert_eq!(rendered.samples, expected);
}
