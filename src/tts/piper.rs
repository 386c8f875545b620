//! Piper TTS backend calling a local binary

use super::SpeechSynthesizer;
use crate::audio::AudioBuffer;
use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub struct PiperEngine {
    model_path: PathBuf,
}

impl PiperEngine {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path =
            PathBuf::from(&config.piper_voice_dir).join(format!("{}.onnx", config.piper_voice));

        if !model_path.exists() {
            warn!("⚠️ Piper model not found at {}", model_path.display());
        }

        Ok(Self { model_path })
    }
}

#[async_trait]
impl SpeechSynthesizer for PiperEngine {
    async fn synthesize(&self, text: &str) -> Result<AudioBuffer> {
        info!("📢 Piper synthesizing: '{}'", text);

        if !self.model_path.exists() {
            return Err(anyhow::anyhow!(
                "Piper model file missing: {}",
                self.model_path.display()
            ));
        }

        let model_path = self.model_path.clone();
        let text_owned = text.to_string();

        // Move blocking subprocess work to dedicated thread pool
        tokio::task::spawn_blocking(move || -> Result<AudioBuffer> {
            let wav_path = std::env::temp_dir().join(format!(
                "ibibio_prompt_{}_{}.wav",
                std::process::id(),
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map_err(|e| anyhow::anyhow!("Time error: {}", e))?
                    .as_millis()
            ));

            let mut child = Command::new("piper-tts")
                .arg("-m")
                .arg(&model_path)
                .arg("-f")
                .arg(&wav_path)
                .stdin(Stdio::piped())
                .spawn()
                .map_err(|e| {
                    error!("❌ Failed to spawn piper-tts: {}", e);
                    anyhow::anyhow!("Failed to spawn piper-tts: {}", e)
                })?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(text_owned.as_bytes())?;
                stdin.flush()?;
            }

            let status = child.wait()?;
            if !status.success() {
                return Err(anyhow::anyhow!("Piper failed with status {}", status));
            }

            if !wav_path.exists() {
                return Err(anyhow::anyhow!("Piper output file not created"));
            }

            let bytes = std::fs::read(&wav_path)?;
            let _ = std::fs::remove_file(&wav_path);
            debug!("✅ Piper produced {} bytes", bytes.len());
            Ok(AudioBuffer::new(bytes))
        })
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    fn name(&self) -> &str {
        "piper"
    }
}
