mod common;

use std::sync::Arc;
use std::thread;

use common::*;
use vocalshift::{
    render, render_with_notes, EngineConfig, EngineControls, ParamSnapshot, ScaleType,
    VocalEngine,
};

fn assert_pitch_near(signal: &[f32], expected: f32, tolerance: f32, what: &str) {
    for &start in &[16_384usize, 24_576, 32_768] {
        let f0 = pitch_at(signal, start, 2048);
        assert!(
            (f0 - expected).abs() / expected < tolerance,
            "{}: expected ~{} Hz at {}, got {}",
            what,
            expected,
            start,
            f0
        );
    }
}

#[test]
fn full_correction_pulls_a_flat_tone_onto_the_scale() {
    let input = gen_sine(225.0, SR, SR as usize, 0.5);
    let params = ParamSnapshot {
        correction_amount: 1.0,
        correction_speed: 0.0,
        key: 0,
        scale: ScaleType::Major,
        ..neutral_params()
    };
    let out = render(&input, &EngineConfig::default(), &params, 256).unwrap();
    assert_pitch_near(&out, 220.0, 0.01, "C major snap");
}

#[test]
fn zero_correction_leaves_pitch_alone() {
    let input = gen_sine(225.0, SR, SR as usize, 0.5);
    let out = render(&input, &EngineConfig::default(), &neutral_params(), 256).unwrap();
    assert_pitch_near(&out, 225.0, 0.005, "no correction");
}

#[test]
fn transposition_without_correction() {
    let input = gen_sine(220.0, SR, SR as usize, 0.5);
    let params = ParamSnapshot {
        pitch_shift_semitones: 7.0,
        ..neutral_params()
    };
    let out = render(&input, &EngineConfig::default(), &params, 512).unwrap();
    assert_pitch_near(&out, 329.63, 0.015, "fifth up");

    let params = ParamSnapshot {
        pitch_shift_semitones: -12.0,
        ..neutral_params()
    };
    let out = render(&input, &EngineConfig::default(), &params, 512).unwrap();
    assert_pitch_near(&out, 110.0, 0.015, "octave down");
}

#[test]
fn custom_note_mask_overrides_the_scale() {
    let input = gen_sine(225.0, SR, SR as usize, 0.5);
    let params = ParamSnapshot {
        correction_amount: 1.0,
        correction_speed: 0.0,
        ..neutral_params()
    };
    let mut only_e = [false; 12];
    only_e[4] = true;
    let out =
        render_with_notes(&input, &EngineConfig::default(), &params, Some(only_e), 300).unwrap();
    assert_pitch_near(&out, 164.81, 0.015, "E only");
}

#[test]
fn engine_follows_controls_written_from_another_thread() {
    let controls = Arc::new(EngineControls::new(&ParamSnapshot {
        correction_amount: 1.0,
        correction_speed: 0.0,
        ..neutral_params()
    }));
    let mut engine = VocalEngine::new(EngineConfig::default()).unwrap();
    let mut audio = gen_sine(225.0, SR, SR as usize, 0.5);

    let (first, second) = audio.split_at_mut(SR as usize / 2);
    for block in first.chunks_mut(441) {
        engine.process_block(block, &controls.snapshot());
    }
    assert!((engine.target_pitch() - 220.0).abs() < 1.0, "{}", engine.target_pitch());

    // D# natural minor: D#, F, F#, G#, A#, B, C#.
    let writer = Arc::clone(&controls);
    thread::spawn(move || {
        writer.set_key(3);
        writer.set_scale(ScaleType::Minor);
    })
    .join()
    .unwrap();

    for block in second.chunks_mut(441) {
        engine.process_block(block, &controls.snapshot());
    }
    // 225 Hz is MIDI 57.4, nearest to A#3 in the new scale.
    assert!(
        (engine.target_pitch() - 233.08).abs() < 1.5,
        "target {}",
        engine.target_pitch()
    );
}
