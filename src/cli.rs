use std::path::Path;

use vocalshift::correct::parse_key;
use vocalshift::io::{read_preset_json, write_preset_json, WavEncoding, BUILTIN_PRESETS};
use vocalshift::{EngineConfig, EnvelopeStrategy, ParamSnapshot, Preset, ScaleType};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        print_usage();
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];

    let mut correction: Option<f32> = None;
    let mut speed: Option<f32> = None;
    let mut pitch: Option<f32> = None;
    let mut formant: Option<f32> = None;
    let mut breath: Option<f32> = None;
    let mut resonance: Option<f32> = None;
    let mut resonance_freq: Option<f32> = None;
    let mut key: Option<u8> = None;
    let mut scale: Option<ScaleType> = None;
    let mut notes: Option<[bool; 12]> = None;
    let mut preset_arg: Option<String> = None;
    let mut save_preset: Option<String> = None;
    let mut block_size: usize = vocalshift::DEFAULT_BLOCK_SIZE;
    let mut frame_len: Option<usize> = None;
    let mut hop: Option<usize> = None;
    let mut envelope: Option<EnvelopeStrategy> = None;
    let mut preserve_formants = false;
    let mut soft_clip = true;
    let mut format_float = false;
    let mut verbose = false;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--correction" | "-c" => {
                i += 1;
                correction = Some(parse_f32(&args, i, "correction"));
            }
            "--speed" | "-s" => {
                i += 1;
                speed = Some(parse_f32(&args, i, "speed"));
            }
            "--pitch" | "-p" => {
                i += 1;
                pitch = Some(parse_f32(&args, i, "pitch"));
            }
            "--formant" | "-f" => {
                i += 1;
                formant = Some(parse_f32(&args, i, "formant"));
            }
            "--breath" => {
                i += 1;
                breath = Some(parse_f32(&args, i, "breath"));
            }
            "--resonance" => {
                i += 1;
                resonance = Some(parse_f32(&args, i, "resonance"));
            }
            "--resonance-freq" => {
                i += 1;
                resonance_freq = Some(parse_f32(&args, i, "resonance-freq"));
            }
            "--key" | "-k" => {
                i += 1;
                let value = require_value(&args, i, "key");
                key = Some(parse_key(value).unwrap_or_else(|e| fail(&e.to_string())));
            }
            "--scale" => {
                i += 1;
                let value = require_value(&args, i, "scale");
                scale = Some(value.parse().unwrap_or_else(|e: vocalshift::VocalError| {
                    fail(&e.to_string())
                }));
            }
            "--notes" => {
                i += 1;
                notes = Some(parse_notes(require_value(&args, i, "notes")));
            }
            "--preset" => {
                i += 1;
                preset_arg = Some(require_value(&args, i, "preset").to_string());
            }
            "--save-preset" => {
                i += 1;
                save_preset = Some(require_value(&args, i, "save-preset").to_string());
            }
            "--block-size" => {
                i += 1;
                block_size = parse_usize(&args, i, "block-size");
            }
            "--frame-len" => {
                i += 1;
                frame_len = Some(parse_usize(&args, i, "frame-len"));
            }
            "--hop" => {
                i += 1;
                hop = Some(parse_usize(&args, i, "hop"));
            }
            "--envelope" => {
                i += 1;
                envelope = Some(parse_envelope(require_value(&args, i, "envelope")));
            }
            "--preserve-formants" => preserve_formants = true,
            "--no-soft-clip" => soft_clip = false,
            "--float" => format_float = true,
            "--verbose" | "-v" => verbose = true,
            other => {
                eprintln!("ERROR: Unknown option '{}'", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "warn" }),
    )
    .init();

    let mut preset = match preset_arg.as_deref() {
        Some(arg) => load_preset(arg),
        None => Preset::new("custom", ParamSnapshot::default()),
    };

    let params = &mut preset.params;
    if let Some(v) = correction {
        params.correction_amount = v;
    }
    if let Some(v) = speed {
        params.correction_speed = v;
    }
    if let Some(v) = pitch {
        params.pitch_shift_semitones = v;
    }
    if let Some(v) = formant {
        params.formant_shift_semitones = v;
    }
    if let Some(v) = breath {
        params.breath_amount = v;
    }
    if let Some(v) = resonance {
        params.resonance_amount = v;
    }
    if let Some(v) = resonance_freq {
        params.resonance_freq_hz = v;
    }
    if let Some(v) = key {
        params.key = v;
    }
    if let Some(v) = scale {
        params.scale = v;
    }
    preset.params = preset.params.sanitized();
    if notes.is_some() {
        preset.active_notes = notes;
    }

    if let Some(path) = save_preset.as_deref() {
        if let Err(e) = write_preset_json(Path::new(path), &preset) {
            eprintln!("ERROR: Failed to save preset {}: {}", path, e);
            std::process::exit(1);
        }
        eprintln!("Preset saved to {}", path);
    }

    let audio = match vocalshift::io::read_wav_file(input_path) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("ERROR: Failed to read {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    eprintln!(
        "Input: {} samples, {} Hz, {} channel(s), {:.2}s",
        audio.samples.len(),
        audio.sample_rate,
        audio.source_channels,
        audio.duration_secs()
    );
    if audio.source_channels > 1 {
        eprintln!("WARNING: Only the first channel is processed");
    }

    let mut config = EngineConfig::new(audio.sample_rate)
        .with_preserve_formants(preserve_formants)
        .with_soft_clip(soft_clip);
    if let Some(n) = frame_len {
        config = config.with_frame_len(n);
    }
    if let Some(h) = hop {
        config = config.with_hop(h);
    }
    if let Some(e) = envelope {
        config = config.with_envelope(e);
    }

    if verbose {
        let p = &preset.params;
        eprintln!("Preset: {}", preset.name);
        eprintln!(
            "  Correction: {:.2} (speed {:.2}), key {}, scale {}",
            p.correction_amount,
            p.correction_speed,
            vocalshift::correct::NOTE_NAMES[p.key as usize % 12],
            p.scale
        );
        eprintln!(
            "  Pitch shift: {:+.2} st, formant shift: {:+.2} st",
            p.pitch_shift_semitones, p.formant_shift_semitones
        );
        eprintln!(
            "  Breath: {:.2}, resonance: {:.2} at {:.0} Hz",
            p.breath_amount, p.resonance_amount, p.resonance_freq_hz
        );
        if let Some(mask) = preset.active_notes {
            eprintln!("  Notes: {}", format_notes(&mask));
        }
        eprintln!(
            "  Frame: {}, hop: {}, envelope: {:?}, latency: {} samples",
            config.frame_len,
            config.hop,
            config.envelope,
            config.latency_samples()
        );
    }

    let start = std::time::Instant::now();

    let output = match vocalshift::render_with_notes(
        &audio.samples,
        &config,
        &preset.params,
        preset.active_notes,
        block_size,
    ) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("ERROR: Processing failed: {}", e);
            std::process::exit(1);
        }
    };

    if verbose {
        let processing_secs = start.elapsed().as_secs_f64();
        let realtime_factor = if processing_secs > 0.0 {
            audio.duration_secs() / processing_secs
        } else {
            f64::INFINITY
        };
        eprintln!(
            "Processing time: {:.3}s ({:.1}x realtime)",
            processing_secs, realtime_factor
        );
    }

    let encoding = if format_float {
        WavEncoding::Float32
    } else {
        WavEncoding::Pcm16
    };
    if let Err(e) =
        vocalshift::io::write_wav_file(output_path, &output, audio.sample_rate, encoding)
    {
        eprintln!("ERROR: Failed to write {}: {}", output_path, e);
        std::process::exit(1);
    }

    eprintln!("Written to {}", output_path);
}

fn print_usage() {
    eprintln!("Usage: vocalshift <input.wav> <output.wav> [options]");
    eprintln!();
    eprintln!("Correction:");
    eprintln!("  --correction, -c <f>   Amount of pull toward the scale, 0..1 (default: 0.5)");
    eprintln!("  --speed, -s <f>        Glide slowness, 0 = instant (default: 0.2)");
    eprintln!("  --key, -k <k>          Root key: 0-11 or C, C#, Db ... B (default: C)");
    eprintln!("  --scale <name>         major, minor, chromatic, pentatonic, blues,");
    eprintln!("                         dorian, mixolydian, lydian, phrygian");
    eprintln!("  --notes <list>         Custom note set, e.g. C,E,G,A#");
    eprintln!();
    eprintln!("Shifting and character:");
    eprintln!("  --pitch, -p <st>       Transpose, -24..24 semitones");
    eprintln!("  --formant, -f <st>     Formant shift, -12..12 semitones");
    eprintln!("  --breath <f>           Breath noise, 0..1");
    eprintln!("  --resonance <f>        Resonance peak, 0..1 (default: 0.5)");
    eprintln!("  --resonance-freq <hz>  Resonance centre, 200..8000 (default: 2500)");
    eprintln!();
    eprintln!("Presets:");
    eprintln!("  --preset <name|file>   {} or a JSON file", BUILTIN_PRESETS.join(", "));
    eprintln!("  --save-preset <file>   Save the final settings as JSON");
    eprintln!();
    eprintln!("Engine:");
    eprintln!("  --block-size <N>       Host block size (default: 512)");
    eprintln!("  --frame-len <N>        Analysis frame, power of two (default: 2048)");
    eprintln!("  --hop <N>              Hop between frames (default: 512)");
    eprintln!("  --envelope <type>      lpc (default) or moving-average");
    eprintln!("  --preserve-formants    Keep formants in place while transposing");
    eprintln!("  --no-soft-clip         Disable output tanh limiting");
    eprintln!("  --float                Write 32-bit float output (default: 16-bit)");
    eprintln!("  --verbose, -v          Show settings and timing, debug logging");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  vocalshift in.wav out.wav --correction 1 --speed 0 --key A --scale minor");
    eprintln!("  vocalshift in.wav out.wav --preset chipmunk");
    eprintln!("  vocalshift in.wav out.wav --pitch -5 --formant 2 --save-preset low.json");
}

fn fail(message: &str) -> ! {
    eprintln!("ERROR: {}", message);
    std::process::exit(1);
}

fn require_value<'a>(args: &'a [String], idx: usize, name: &str) -> &'a str {
    if idx >= args.len() {
        fail(&format!("--{} requires a value", name));
    }
    &args[idx]
}

fn parse_f32(args: &[String], idx: usize, name: &str) -> f32 {
    let value = require_value(args, idx, name);
    match value.parse::<f32>() {
        Ok(v) if v.is_finite() => v,
        _ => fail(&format!("Invalid {}: {}", name, value)),
    }
}

fn parse_usize(args: &[String], idx: usize, name: &str) -> usize {
    let value = require_value(args, idx, name);
    value
        .parse()
        .unwrap_or_else(|_| fail(&format!("Invalid {}: {}", name, value)))
}

fn parse_envelope(s: &str) -> EnvelopeStrategy {
    match s {
        "lpc" => EnvelopeStrategy::Lpc,
        "moving-average" | "ma" | "smooth" => EnvelopeStrategy::MovingAverage,
        other => fail(&format!(
            "Unknown envelope '{}' (use lpc or moving-average)",
            other
        )),
    }
}

/// Parses a comma-separated note list into a pitch-class mask.
fn parse_notes_str(s: &str) -> Result<[bool; 12], String> {
    let mut mask = [false; 12];
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let pc = parse_key(part).map_err(|e| e.to_string())?;
        mask[pc as usize] = true;
    }
    if mask.iter().any(|&on| on) {
        Ok(mask)
    } else {
        Err("note list is empty".to_string())
    }
}

fn parse_notes(s: &str) -> [bool; 12] {
    parse_notes_str(s).unwrap_or_else(|e| fail(&format!("Invalid notes '{}': {}", s, e)))
}

fn format_notes(mask: &[bool; 12]) -> String {
    vocalshift::correct::NOTE_NAMES
        .iter()
        .zip(mask)
        .filter(|(_, on)| **on)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(",")
}

fn load_preset(arg: &str) -> Preset {
    if let Some(p) = Preset::builtin(arg) {
        return p;
    }
    match read_preset_json(Path::new(arg)) {
        Ok(p) => p,
        Err(e) => fail(&format!(
            "'{}' is neither a built-in preset ({}) nor a readable preset file: {}",
            arg,
            BUILTIN_PRESETS.join(", "),
            e
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope_names() {
        assert_eq!(parse_envelope("lpc"), EnvelopeStrategy::Lpc);
        assert_eq!(parse_envelope("moving-average"), EnvelopeStrategy::MovingAverage);
        assert_eq!(parse_envelope("ma"), EnvelopeStrategy::MovingAverage);
    }

    #[test]
    fn test_parse_notes_mask() {
        let mask = parse_notes_str("C, E,G,A#").unwrap();
        let on: Vec<usize> = (0..12).filter(|&i| mask[i]).collect();
        assert_eq!(on, vec![0, 4, 7, 10]);
        assert_eq!(format_notes(&mask), "C,E,G,A#");
    }

    #[test]
    fn test_parse_notes_rejects_empty_and_unknown() {
        assert!(parse_notes_str("").is_err());
        assert!(parse_notes_str(" , ").is_err());
        assert!(parse_notes_str("C,H").is_err());
    }
}
