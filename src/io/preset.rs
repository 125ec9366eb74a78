//! Named parameter presets stored as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::{ParamSnapshot, ScaleType};
use crate::error::VocalError;

/// Names accepted by [`Preset::builtin`].
pub const BUILTIN_PRESETS: [&str; 5] = ["natural", "hard_tune", "chipmunk", "deep_voice", "airy"];

/// A saved set of controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub params: ParamSnapshot,
    /// Piano-roll selection overriding the key/scale mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_notes: Option<[bool; 12]>,
}

impl Preset {
    pub fn new(name: impl Into<String>, params: ParamSnapshot) -> Self {
        Self {
            name: name.into(),
            params,
            active_notes: None,
        }
    }

    /// Attaches a custom note mask.
    pub fn with_active_notes(mut self, notes: [bool; 12]) -> Self {
        self.active_notes = Some(notes);
        self
    }

    /// Looks up a built-in preset by name (case-insensitive, `-` or `_`).
    pub fn builtin(name: &str) -> Option<Self> {
        let key = name.trim().to_ascii_lowercase().replace('-', "_");
        let base = ParamSnapshot::default();
        let params = match key.as_str() {
            "natural" => ParamSnapshot {
                correction_amount: 0.4,
                correction_speed: 0.3,
                resonance_amount: 0.2,
                ..base
            },
            "hard_tune" => ParamSnapshot {
                correction_amount: 1.0,
                correction_speed: 0.0,
                resonance_amount: 0.3,
                scale: ScaleType::Chromatic,
                ..base
            },
            "chipmunk" => ParamSnapshot {
                correction_amount: 0.0,
                pitch_shift_semitones: 12.0,
                formant_shift_semitones: 6.0,
                resonance_amount: 0.0,
                ..base
            },
            "deep_voice" => ParamSnapshot {
                correction_amount: 0.0,
                pitch_shift_semitones: -7.0,
                formant_shift_semitones: -4.0,
                resonance_amount: 0.4,
                resonance_freq_hz: 900.0,
                ..base
            },
            "airy" => ParamSnapshot {
                correction_amount: 0.3,
                breath_amount: 0.6,
                resonance_amount: 0.5,
                resonance_freq_hz: 5000.0,
                ..base
            },
            _ => return None,
        };
        Some(Self::new(key, params))
    }
}

/// Writes a preset as pretty JSON.
pub fn write_preset_json(path: &Path, preset: &Preset) -> Result<(), VocalError> {
    let json = serde_json::to_string_pretty(preset).map_err(|e| {
        VocalError::InvalidFormat(format!("failed to serialize preset {}: {}", preset.name, e))
    })?;
    std::fs::write(path, json)?;
    log::info!("saved preset '{}' to {}", preset.name, path.display());
    Ok(())
}

/// Reads a preset from JSON. Missing fields take their defaults and the
/// parameters are clamped to their valid ranges.
pub fn read_preset_json(path: &Path) -> Result<Preset, VocalError> {
    let data = std::fs::read_to_string(path)?;
    let mut preset: Preset = serde_json::from_str(&data).map_err(|e| {
        VocalError::InvalidFormat(format!(
            "failed to parse preset from {}: {}",
            path.display(),
            e
        ))
    })?;
    preset.params = preset.params.sanitized();
    log::info!("loaded preset '{}' from {}", preset.name, path.display());
    Ok(preset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_resolves() {
        for name in BUILTIN_PRESETS {
            let preset = Preset::builtin(name).unwrap();
            assert_eq!(preset.name, name);
            assert_eq!(preset.params, preset.params.sanitized(), "{} out of range", name);
        }
        assert_eq!(Preset::builtin("Hard-Tune").unwrap().name, "hard_tune");
        assert!(Preset::builtin("robot").is_none());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        std::fs::write(&path, r#"{"name":"x","params":{"pitch_shift_semitones":40}}"#).unwrap();
        let preset = read_preset_json(&path).unwrap();
        assert_eq!(preset.params.pitch_shift_semitones, 24.0);
        assert_eq!(preset.params.correction_speed, 0.2);
        assert!(preset.active_notes.is_none());
    }

    #[test]
    fn test_bad_json_is_invalid_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            read_preset_json(&path),
            Err(VocalError::InvalidFormat(_))
        ));
        assert!(matches!(
            read_preset_json(&dir.path().join("missing.json")),
            Err(VocalError::IoError(_))
        ));
    }
}
