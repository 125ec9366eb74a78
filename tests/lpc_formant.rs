mod common;

use common::*;
use vocalshift::analysis::LpcAnalyzer;
use vocalshift::core::window::{apply_window, generate_window, WindowType};
use vocalshift::{EngineConfig, EnvelopeStrategy, ParamSnapshot, VocalEngine};

fn envelope_peak(lpc: &LpcAnalyzer, max_hz: f32) -> f32 {
    let freqs: Vec<f32> = (0..=(max_hz as usize / 5)).map(|i| i as f32 * 5.0).collect();
    let mut env = vec![0.0f32; freqs.len()];
    lpc.spectral_envelope(&freqs, &mut env);
    let (idx, _) = env
        .iter()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
    freqs[idx]
}

#[test]
fn lpc_envelope_peaks_at_the_resonance() {
    for &centre in &[700.0f32, 1500.0, 2800.0] {
        let excitation = gen_noise(8192, 0.5, 42);
        let voiced = resonate(&excitation, centre, 0.98, SR);
        let window = generate_window(WindowType::Hann, 2048);
        let mut frame = voiced[4096..6144].to_vec();
        apply_window(&mut frame, &window);

        let mut lpc = LpcAnalyzer::new(12, SR);
        assert!(lpc.analyze(&frame));
        let peak = envelope_peak(&lpc, 5000.0);
        assert!(
            (peak - centre).abs() / centre < 0.05,
            "resonance at {} Hz, envelope peak at {} Hz",
            centre,
            peak
        );
        assert!(lpc.prediction_error() > 0.0);
    }
}

#[test]
fn lpc_of_silence_is_flat() {
    let mut lpc = LpcAnalyzer::new(12, SR);
    assert!(lpc.analyze(&vec![0.0; 2048]));
    assert_eq!(lpc.coefficients()[0], 1.0);
    assert!(lpc.coefficients()[1..].iter().all(|&c| c == 0.0));

    let freqs = [0.0f32, 1000.0, 10_000.0];
    let mut env = [0.0f32; 3];
    lpc.spectral_envelope(&freqs, &mut env);
    assert_eq!(env, [1.0, 1.0, 1.0]);
}

#[test]
fn formant_shift_keeps_the_pitch() {
    for strategy in [EnvelopeStrategy::Lpc, EnvelopeStrategy::MovingAverage] {
        let config = EngineConfig::default().with_envelope(strategy);
        let mut engine = VocalEngine::new(config).unwrap();
        let params = ParamSnapshot {
            formant_shift_semitones: 4.0,
            ..neutral_params()
        };
        let mut audio = gen_harmonic(196.0, SR, SR as usize, 8);
        for block in audio.chunks_mut(512) {
            engine.process_block(block, &params);
        }
        assert!(audio.iter().all(|v| v.is_finite()));
        let f0 = pitch_at(&audio, 30_000, 2048);
        assert!(
            (f0 - 196.0).abs() / 196.0 < 0.02,
            "{:?}: formant shift moved pitch to {}",
            strategy,
            f0
        );
        assert!(rms(&audio[20_000..]) > 0.01, "{:?}: output collapsed", strategy);
    }
}
