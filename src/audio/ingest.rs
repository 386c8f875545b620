//! Uploaded translation recordings

use super::{AudioBuffer, AudioFormat};
use crate::error::{TranslatorError, TranslatorResult};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Layout of an accepted recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordingInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub duration: Duration,
}

/// A recording the user supplied as their translation
#[derive(Debug, Clone)]
pub struct Recording {
    pub buffer: AudioBuffer,
    pub info: RecordingInfo,
}

impl Recording {
    /// Validate an in-memory WAV buffer
    pub fn from_buffer(buffer: AudioBuffer) -> TranslatorResult<Self> {
        if buffer.format() != AudioFormat::Wav {
            return Err(TranslatorError::Validation(
                "Upload audio file in .wav format.".to_string(),
            ));
        }
        let pcm = buffer.decode()?;
        let info = RecordingInfo {
            sample_rate: pcm.sample_rate,
            channels: pcm.channels,
            duration: pcm.duration(),
        };
        Ok(Self { buffer, info })
    }
}

/// Load and decode an uploaded `.wav` file
pub fn load_upload(path: &Path) -> TranslatorResult<Recording> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    if !is_wav {
        return Err(TranslatorError::Validation(
            "Upload audio file in .wav format.".to_string(),
        ));
    }

    let recording = Recording::from_buffer(AudioBuffer::from_file(path)?)?;
    info!(
        "🎧 Loaded recording {:?} ({} Hz, {} ch, {:.1}s)",
        path.file_name().unwrap_or_default(),
        recording.info.sample_rate,
        recording.info.channels,
        recording.info.duration.as_secs_f32()
    );
    Ok(recording)
}
