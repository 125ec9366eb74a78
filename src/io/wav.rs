//! Minimal RIFF/WAVE reader and writer for the offline renderer.
//!
//! Reading accepts 16/24-bit PCM and 32-bit float with any channel count;
//! only the first channel is kept since the engine is mono.

use std::path::Path;

use crate::error::VocalError;

const WAV_FORMAT_PCM: u16 = 1;
const WAV_FORMAT_IEEE_FLOAT: u16 = 3;
const WAV_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Decoded mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct MonoAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count of the source file before the first channel was taken.
    pub source_channels: u16,
}

impl MonoAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            source_channels: 1,
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Output sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavEncoding {
    #[default]
    Pcm16,
    Float32,
}

impl WavEncoding {
    fn format_code(self) -> u16 {
        match self {
            WavEncoding::Pcm16 => WAV_FORMAT_PCM,
            WavEncoding::Float32 => WAV_FORMAT_IEEE_FLOAT,
        }
    }

    fn bits(self) -> u16 {
        match self {
            WavEncoding::Pcm16 => 16,
            WavEncoding::Float32 => 32,
        }
    }
}

struct FmtChunk {
    format_code: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

/// Decodes a WAV image.
pub fn read_wav(data: &[u8]) -> Result<MonoAudio, VocalError> {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(VocalError::InvalidFormat(
            "missing RIFF/WAVE header".to_string(),
        ));
    }

    let mut fmt: Option<FmtChunk> = None;
    let mut audio: Option<&[u8]> = None;
    let mut cursor = 12;

    while cursor + 8 <= data.len() {
        let id = &data[cursor..cursor + 4];
        let size = read_u32_le(data, cursor + 4) as usize;
        let body_start = cursor + 8;
        let body_end = body_start.saturating_add(size).min(data.len());
        let body = &data[body_start..body_end];

        match id {
            b"fmt " => {
                if body.len() < 16 {
                    return Err(VocalError::InvalidFormat("fmt chunk too short".to_string()));
                }
                let mut format_code = read_u16_le(body, 0);
                if format_code == WAV_FORMAT_EXTENSIBLE && body.len() >= 26 {
                    // Sub-format GUID starts with the plain format code.
                    format_code = read_u16_le(body, 24);
                }
                fmt = Some(FmtChunk {
                    format_code,
                    channels: read_u16_le(body, 2),
                    sample_rate: read_u32_le(body, 4),
                    bits_per_sample: read_u16_le(body, 14),
                });
            }
            b"data" => audio = Some(body),
            _ => {}
        }

        // Chunks are word-aligned.
        cursor = body_start.saturating_add(size).saturating_add(size & 1);
    }

    let fmt = fmt.ok_or_else(|| VocalError::InvalidFormat("no fmt chunk".to_string()))?;
    let audio = audio.ok_or_else(|| VocalError::InvalidFormat("no data chunk".to_string()))?;
    if fmt.sample_rate == 0 {
        return Err(VocalError::InvalidSampleRate(0));
    }
    if fmt.channels == 0 {
        return Err(VocalError::InvalidFormat("zero channels".to_string()));
    }

    let width = match (fmt.format_code, fmt.bits_per_sample) {
        (WAV_FORMAT_PCM, 16) => 2,
        (WAV_FORMAT_PCM, 24) => 3,
        (WAV_FORMAT_IEEE_FLOAT, 32) => 4,
        (code, bits) => {
            return Err(VocalError::InvalidFormat(format!(
                "unsupported WAV encoding: code={}, bits={}",
                code, bits
            )))
        }
    };
    let stride = width * fmt.channels as usize;
    let samples = audio
        .chunks_exact(stride)
        .map(|frame| decode_sample(fmt.format_code, &frame[..width]))
        .collect();

    Ok(MonoAudio {
        samples,
        sample_rate: fmt.sample_rate,
        source_channels: fmt.channels,
    })
}

fn decode_sample(format_code: u16, bytes: &[u8]) -> f32 {
    match (format_code, bytes.len()) {
        (WAV_FORMAT_PCM, 2) => i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32768.0,
        (WAV_FORMAT_PCM, 3) => {
            // Place in the top 24 bits so the shift sign-extends.
            let raw = i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) >> 8;
            raw as f32 / 8_388_608.0
        }
        _ => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

/// Reads and decodes a WAV file.
pub fn read_wav_file(path: impl AsRef<Path>) -> Result<MonoAudio, VocalError> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .map_err(|e| VocalError::IoError(format!("{}: {}", path.display(), e)))?;
    read_wav(&data)
}

/// Encodes mono samples as a WAV image.
pub fn write_wav(samples: &[f32], sample_rate: u32, encoding: WavEncoding) -> Vec<u8> {
    let bits = encoding.bits();
    let block_align = bits / 8;
    let data_size = (samples.len() * block_align as usize) as u32;

    let mut out = Vec::with_capacity(44 + data_size as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&encoding.format_code().to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    match encoding {
        WavEncoding::Pcm16 => {
            for &s in samples {
                let raw = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
                out.extend_from_slice(&raw.to_le_bytes());
            }
        }
        WavEncoding::Float32 => {
            for &s in samples {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
    }
    out
}

/// Encodes and writes a WAV file.
pub fn write_wav_file(
    path: impl AsRef<Path>,
    samples: &[f32],
    sample_rate: u32,
    encoding: WavEncoding,
) -> Result<(), VocalError> {
    let path = path.as_ref();
    std::fs::write(path, write_wav(samples, sample_rate, encoding))
        .map_err(|e| VocalError::IoError(format!("{}: {}", path.display(), e)))
}

#[inline]
fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline]
fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm_header(channels: u16, bits: u16, data_len: u32) -> Vec<u8> {
        let block_align = channels * bits / 8;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&WAV_FORMAT_PCM.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&22050u32.to_le_bytes());
        out.extend_from_slice(&(22050 * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out
    }

    #[test]
    fn test_16bit_round_trip() {
        let original = vec![0.0, 0.5, -0.5, 1.0, -1.0];
        let decoded = read_wav(&write_wav(&original, 44100, WavEncoding::Pcm16)).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.source_channels, 1);
        assert_eq!(decoded.samples.len(), 5);
        for (a, b) in decoded.samples.iter().zip(&original) {
            assert!((a - b).abs() < 0.001, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_float_is_lossless() {
        let original = vec![0.1, -0.2, 0.3, 1.5];
        let decoded = read_wav(&write_wav(&original, 48000, WavEncoding::Float32)).unwrap();
        assert_eq!(decoded.samples, original);
    }

    #[test]
    fn test_stereo_keeps_first_channel() {
        let mut wav = pcm_header(2, 16, 8);
        for v in [16384i16, -100, -16384, 200] {
            wav.extend_from_slice(&v.to_le_bytes());
        }
        let decoded = read_wav(&wav).unwrap();
        assert_eq!(decoded.source_channels, 2);
        assert_eq!(decoded.samples, vec![0.5, -0.5]);
    }

    #[test]
    fn test_24bit_sign_extension() {
        let mut wav = pcm_header(1, 24, 6);
        wav.extend_from_slice(&[0x00, 0x00, 0x40]); // +0.5
        wav.extend_from_slice(&[0x00, 0x00, 0xC0]); // -0.5
        let decoded = read_wav(&wav).unwrap();
        assert_eq!(decoded.samples, vec![0.5, -0.5]);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(read_wav(&[]).is_err());
        assert!(read_wav(b"NOT_RIFF_HEADER_AT_ALL______________________").is_err());
        let header_only = pcm_header(1, 8, 0);
        assert!(matches!(
            read_wav(&header_only),
            Err(VocalError::InvalidFormat(_))
        ));
    }
}
