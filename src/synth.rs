/// Tiny tone generator used to (re)create the bullet-hit effect.
use std::f32::consts::TAU;
use std::fs;
use std::io;
use std::path::Path;

pub const SAMPLE_RATE: u32 = 44_100;
pub const HIT_FREQUENCY: f32 = 600.0;
pub const HIT_DURATION: f32 = 0.2;

/// Full-scale 16-bit sine wave.
pub fn sine_samples(sample_rate: u32, frequency: f32, duration: f32) -> Vec<i16> {
    let n = (sample_rate as f32 * duration) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (i16::MAX as f32 * (TAU * frequency * t).sin()) as i16
        })
        .collect()
}

/// The short "pew" played whenever a bullet hits something.
pub fn hit_samples() -> Vec<i16> {
    sine_samples(SAMPLE_RATE, HIT_FREQUENCY, HIT_DURATION)
}

/// Encode mono 16-bit PCM as a canonical 44-byte-header WAV file.
pub fn encode_wav(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut buf = Vec::with_capacity(44 + data_len as usize);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_len).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    buf.extend_from_slice(&2u16.to_le_bytes()); // block align
    buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        buf.extend_from_slice(&s.to_le_bytes());
    }
    buf
}

pub fn write_hit_sound(path: &Path) -> io::Result<()> {
    fs::write(path, encode_wav(SAMPLE_RATE, &hit_samples()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_tone_has_expected_length() {
        assert_eq!(hit_samples().len(), 8820);
    }

    #[test]
    fn wav_header_fields() {
        let wav = encode_wav(SAMPLE_RATE, &[0, 1, -1]);
        assert_eq!(wav.len(), 44 + 6);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), SAMPLE_RATE);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
    }

    #[test]
    fn written_file_loads_as_a_sound() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bullet_hit.wav");
        write_hit_sound(&path).unwrap();
        assert!(crate::assets::load_sound(&path).is_ok());
    }
}
