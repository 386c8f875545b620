//! Mock collaborators for session tests
//!
//! Records synthesized text and serves prompts from a fixed queue.

use anyhow::Result;
use async_trait::async_trait;
use ibibio_translator::audio::{AudioBuffer, Pcm};
use ibibio_translator::prompts::{Prompt, PromptProvider};
use ibibio_translator::tts::SpeechSynthesizer;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock TTS engine that records synthesized text and returns a short tone
#[derive(Debug, Clone)]
pub struct MockTts {
    /// All text that was synthesized
    pub spoken: Arc<Mutex<Vec<String>>>,
    /// Simulate failure on every call
    pub should_fail: Arc<Mutex<bool>>,
}

impl MockTts {
    pub fn new() -> Self {
        Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn get_spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn fail(&self, fail: bool) {
        *self.should_fail.lock().unwrap() = fail;
    }
}

impl Default for MockTts {
    fn default() -> Self {
        Self::new()
    }
}

/// Mono sawtooth at 16 kHz
pub fn tone_wav(frames: usize) -> AudioBuffer {
    let samples = (0..frames).map(|i| ((i % 32) as i16 - 16) * 500).collect();
    Pcm::new(samples, 1, 16000)
        .and_then(|pcm| pcm.encode_wav())
        .expect("Failed to encode tone")
}

#[async_trait]
impl SpeechSynthesizer for MockTts {
    async fn synthesize(&self, text: &str) -> Result<AudioBuffer> {
        if *self.should_fail.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock TTS failure"));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(tone_wav(1600))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Serves prompts in order, repeating the last one when exhausted
#[derive(Debug)]
pub struct FixedPrompts {
    queue: Mutex<VecDeque<Prompt>>,
    last: Mutex<Prompt>,
}

impl FixedPrompts {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            queue: Mutex::new(texts.iter().map(|t| Prompt::new(*t)).collect()),
            last: Mutex::new(Prompt::new("")),
        }
    }
}

#[async_trait]
impl PromptProvider for FixedPrompts {
    async fn next(&self) -> Prompt {
        let mut last = self.last.lock().unwrap();
        if let Some(prompt) = self.queue.lock().unwrap().pop_front() {
            *last = prompt;
        }
        last.clone()
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
