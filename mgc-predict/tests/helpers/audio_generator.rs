//! Audio Test Fixture Generator
//!
//! Builds WAV clips in memory (or on disk) with hound.

use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Sine frequency in Hz
    pub frequency: f32,
    pub amplitude: f32,
    /// Replace the tone with short bursts at this rate
    pub clicks_per_minute: Option<f64>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 3.0,
            sample_rate: 22050,
            channels: 1,
            frequency: 440.0,
            amplitude: 0.3,
            clicks_per_minute: None,
        }
    }
}

impl AudioConfig {
    fn sample_at(&self, i: usize) -> f32 {
        match self.clicks_per_minute {
            Some(bpm) => {
                let period = (60.0 / bpm * self.sample_rate as f64) as usize;
                if i % period.max(1) < 64 {
                    if i % 2 == 0 {
                        self.amplitude
                    } else {
                        -self.amplitude
                    }
                } else {
                    0.0
                }
            }
            None => {
                let t = i as f32 / self.sample_rate as f32;
                self.amplitude * (2.0 * std::f32::consts::PI * self.frequency * t).sin()
            }
        }
    }
}

/// Generate a 16-bit PCM WAV clip as bytes
pub fn generate_wav_bytes(config: &AudioConfig) -> anyhow::Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;
        for i in 0..total_samples {
            let sample = (config.sample_at(i) * i16::MAX as f32) as i16;
            for _ in 0..config.channels {
                writer.write_sample(sample)?;
            }
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Generate a test WAV file with the given configuration
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    std::fs::write(path, generate_wav_bytes(config)?)?;
    Ok(path.to_path_buf())
}
