//! Microphone recording using cpal

use super::{calculate_energy, Pcm};
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

const SAMPLE_RATE: u32 = 16000;
const CHUNK_SIZE: usize = 1024;

/// Below this RMS a recording is probably a muted microphone
const SILENCE_ENERGY: f32 = 30.0;

/// Log the available input devices, marking the selected one
pub fn list_devices(selected: Option<usize>) -> Result<Vec<String>> {
    let host = cpal::default_host();
    let mut names = Vec::new();

    info!("Available audio input devices:");
    for (i, device) in host.input_devices()?.enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let marker = if selected == Some(i) { "*" } else { " " };
        info!("  {} [{}] {}", marker, i, name);
        names.push(name);
    }
    Ok(names)
}

/// Record `duration` of 16 kHz mono audio. Blocks the calling thread.
pub fn record(device_index: Option<usize>, duration: Duration) -> Result<Pcm> {
    let host = cpal::default_host();

    let device = if let Some(idx) = device_index {
        host.input_devices()?
            .nth(idx)
            .context("Device index out of range")?
    } else {
        host.default_input_device()
            .context("No default input device")?
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("🎙️ Recording {:.1}s from: {}", duration.as_secs_f32(), device_name);

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Fixed(CHUNK_SIZE as u32),
    };

    let captured = Arc::new(Mutex::new(Vec::<i16>::new()));
    let sink = captured.clone();

    let stream = device.build_input_stream(
        &config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| {
            if let Ok(mut samples) = sink.lock() {
                samples.extend_from_slice(data);
            }
        },
        |err| {
            warn!("Audio stream error: {}", err);
        },
        None,
    )?;

    stream.play()?;
    std::thread::sleep(duration);
    drop(stream);

    let samples = std::mem::take(
        &mut *captured
            .lock()
            .map_err(|e| anyhow::anyhow!("Capture buffer poisoned: {}", e))?,
    );

    if calculate_energy(&samples) < SILENCE_ENERGY {
        warn!("⚠️ Recording looks silent, check the microphone");
    }

    Ok(Pcm::new(samples, 1, SAMPLE_RATE)?)
}

/// Record to a WAV file and return its path
pub fn record_to_file(
    device_index: Option<usize>,
    duration: Duration,
    path: &Path,
) -> Result<PathBuf> {
    let pcm = record(device_index, duration)?;
    pcm.encode_wav()?.write_to(path)?;
    info!("✅ Saved recording to: {:?}", path);
    Ok(path.to_path_buf())
}

/// Timestamped file name for a new recording of `phrase`
pub fn recording_file_name(phrase: &str) -> String {
    let safe_name: String = phrase
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .take(40)
        .collect();
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.wav", safe_name, timestamp)
}
