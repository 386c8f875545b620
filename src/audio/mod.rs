//! Audio buffers and PCM conversion
//!
//! Synthesized speech, uploads and recordings all travel as encoded
//! `AudioBuffer`s. Decoding goes through rodio, encoding to WAV through
//! hound.

use crate::error::{TranslatorError, TranslatorResult};
use rodio::Source;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

pub mod capture;
pub mod ingest;
pub mod merge;
pub mod playback;

/// Container format detected from the leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    Flac,
    Unknown,
}

impl AudioFormat {
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            AudioFormat::Wav
        } else if bytes.starts_with(b"ID3")
            || (bytes.len() >= 2 && bytes[0] == 0xFF && (bytes[1] & 0xE0) == 0xE0)
        {
            AudioFormat::Mp3
        } else if bytes.starts_with(b"OggS") {
            AudioFormat::Ogg
        } else if bytes.starts_with(b"fLaC") {
            AudioFormat::Flac
        } else {
            AudioFormat::Unknown
        }
    }
}

/// Encoded audio held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    bytes: Vec<u8>,
    format: AudioFormat,
}

impl AudioBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        let format = AudioFormat::sniff(&bytes);
        Self { bytes, format }
    }

    pub fn from_file(path: &Path) -> TranslatorResult<Self> {
        Ok(Self::new(std::fs::read(path)?))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn write_to(&self, path: &Path) -> TranslatorResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }

    /// Decode to interleaved 16-bit PCM
    pub fn decode(&self) -> TranslatorResult<Pcm> {
        let decoder = rodio::Decoder::new(Cursor::new(self.bytes.clone())).map_err(|e| {
            TranslatorError::Audio(format!("Cannot decode {:?} audio: {e}", self.format))
        })?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<i16> = decoder.collect();
        Pcm::new(samples, channels, sample_rate)
    }
}

/// Interleaved 16-bit samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcm {
    pub samples: Vec<i16>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl Pcm {
    pub fn new(samples: Vec<i16>, channels: u16, sample_rate: u32) -> TranslatorResult<Self> {
        if channels == 0 || sample_rate == 0 {
            return Err(TranslatorError::Audio(format!(
                "Invalid audio layout: {channels} channels at {sample_rate} Hz"
            )));
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// `duration` of silence in this layout
    pub fn silence(duration: Duration, channels: u16, sample_rate: u32) -> TranslatorResult<Self> {
        let frames = (duration.as_millis() as u64 * sample_rate as u64 / 1000) as usize;
        Self::new(vec![0; frames * channels as usize], channels, sample_rate)
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Resample and remix to the given layout
    pub fn convert(self, channels: u16, sample_rate: u32) -> TranslatorResult<Self> {
        if self.channels == channels && self.sample_rate == sample_rate {
            return Ok(self);
        }
        let source =
            rodio::buffer::SamplesBuffer::new(self.channels, self.sample_rate, self.samples);
        let converted: Vec<i16> =
            rodio::source::UniformSourceIterator::<_, i16>::new(source, channels, sample_rate)
                .collect();
        Self::new(converted, channels, sample_rate)
    }

    /// Encode as 16-bit PCM WAV
    pub fn encode_wav(&self) -> TranslatorResult<AudioBuffer> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let wav_err = |e: hound::Error| TranslatorError::Audio(format!("WAV encoding failed: {e}"));

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(wav_err)?;
            for &sample in &self.samples {
                writer.write_sample(sample).map_err(wav_err)?;
            }
            writer.finalize().map_err(wav_err)?;
        }
        Ok(AudioBuffer::new(cursor.into_inner()))
    }
}

/// RMS energy of a chunk of samples
pub fn calculate_energy(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: i64 = samples.iter().map(|&s| (s as i64).pow(2)).sum();
    (sum as f32 / samples.len() as f32).sqrt()
}
