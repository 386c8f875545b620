//! TTS (Text-to-Speech) Module
//!
//! Provides a unified interface for speech synthesis backends. Engines
//! return encoded audio instead of speaking directly so the prompt can be
//! played, saved or merged with a recording.

use crate::audio::AudioBuffer;
use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub mod espeak;
pub mod piper;

/// Trait for TTS engines
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + std::fmt::Debug {
    /// Synthesize the given text
    async fn synthesize(&self, text: &str) -> Result<AudioBuffer>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Factory to create the configured TTS engine
pub fn create_engine(config: &Config) -> Result<Arc<dyn SpeechSynthesizer>> {
    info!("🛠️ Creating TTS engine: {}", config.tts_engine);
    let engine: Arc<dyn SpeechSynthesizer> = match config.tts_engine.as_str() {
        "piper" => {
            info!("  - Using Piper TTS (Voice: {})", config.piper_voice);
            Arc::new(piper::PiperEngine::new(config)?)
        }
        "espeak" | "system" => {
            info!("  - Using espeak-ng");
            Arc::new(espeak::EspeakEngine::new())
        }
        _ => {
            warn!(
                "  - Unknown engine '{}', falling back to espeak-ng",
                config.tts_engine
            );
            Arc::new(espeak::EspeakEngine::new())
        }
    };
    info!("✅ TTS engine '{}' initialized", engine.name());
    Ok(engine)
}
