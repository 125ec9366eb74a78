//! File formats: WAV audio and JSON presets.

pub mod preset;
pub mod wav;

pub use preset::{read_preset_json, write_preset_json, Preset, BUILTIN_PRESETS};
pub use wav::{read_wav, read_wav_file, write_wav, write_wav_file, MonoAudio, WavEncoding};
