//! espeak-ng backend, reading WAV from stdout

use super::SpeechSynthesizer;
use crate::audio::{AudioBuffer, AudioFormat};
use anyhow::Result;
use async_trait::async_trait;
use std::process::Command;
use tracing::debug;

#[derive(Debug)]
pub struct EspeakEngine {
    program: String,
    voice: String,
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EspeakEngine {
    pub fn new() -> Self {
        Self::with_program("espeak-ng")
    }

    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
            voice: "en".to_string(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for EspeakEngine {
    async fn synthesize(&self, text: &str) -> Result<AudioBuffer> {
        debug!("espeak synthesizing: {}", text);

        let program = self.program.clone();
        let voice = self.voice.clone();
        let text = text.to_string();

        let output = tokio::task::spawn_blocking(move || {
            Command::new(&program)
                .arg("-v")
                .arg(&voice)
                .arg("--stdout")
                .arg(&text)
                .output()
                .map_err(|e| anyhow::anyhow!("Failed to run {}: {}", program, e))
        })
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))??;

        if !output.status.success() {
            return Err(anyhow::anyhow!(
                "espeak-ng failed with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let buffer = AudioBuffer::new(output.stdout);
        if buffer.format() != AudioFormat::Wav {
            return Err(anyhow::anyhow!("espeak-ng did not produce WAV output"));
        }
        Ok(buffer)
    }

    fn name(&self) -> &str {
        "espeak"
    }
}
