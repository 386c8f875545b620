//! Translation Session
//!
//! One user's working state: the store, the collaborators and the form
//! being filled in. Handlers receive the session explicitly; there is no
//! global state.

use crate::audio::ingest::Recording;
use crate::audio::merge::{merge_audio, MergeCache, MergeKey};
use crate::audio::AudioBuffer;
use crate::config::Config;
use crate::error::{TranslatorError, TranslatorResult};
use crate::prompts::{self, Prompt, PromptProvider};
use crate::store::{ClusterStore, TranslationRecord};
use crate::tts::{self, SpeechSynthesizer};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub mod command;
pub mod interactive;

/// Stored as the translation when only audio was supplied
pub const AUDIO_PROVIDED: &str = "Audio provided";

/// What the user submits for one prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub source_text: String,
    pub translation_text: String,
    pub has_audio: bool,
    pub cluster: String,
}

impl Submission {
    /// Check the form and pick the text to store.
    ///
    /// A translation (text or audio) is checked before the cluster name.
    pub fn resolve(&self) -> TranslatorResult<String> {
        if self.translation_text.is_empty() && !self.has_audio {
            return Err(TranslatorError::Validation(
                "Please provide the Ibibio translation in either text or audio.".to_string(),
            ));
        }
        if self.cluster.trim().is_empty() {
            return Err(TranslatorError::Validation(
                "Please provide a cluster name.".to_string(),
            ));
        }
        if self.translation_text.is_empty() {
            Ok(AUDIO_PROVIDED.to_string())
        } else {
            Ok(self.translation_text.clone())
        }
    }
}

/// Form fields kept between commands
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub translation: String,
    pub recording: Option<Recording>,
    pub cluster: String,
}

#[derive(Debug)]
pub struct TranslationSession {
    store: ClusterStore,
    prompts: Arc<dyn PromptProvider>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    merge_cache: MergeCache,
    merge_gap: Duration,
    current: Option<Prompt>,
    draft: Draft,
}

impl TranslationSession {
    pub fn new(
        store: ClusterStore,
        prompts: Arc<dyn PromptProvider>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            store,
            prompts,
            synthesizer,
            merge_cache: MergeCache::default(),
            merge_gap: crate::audio::merge::DEFAULT_GAP,
            current: None,
            draft: Draft::default(),
        }
    }

    /// Build the collaborators named in `config` around `store`
    pub fn from_config(config: &Config, store: ClusterStore) -> anyhow::Result<Self> {
        let prompts = prompts::create_provider(config);
        let synthesizer = tts::create_engine(config)?;
        Ok(Self::new(store, prompts, synthesizer)
            .with_merge_settings(config.merge_gap(), MergeCache::new(config.merge_cache_ttl())))
    }

    pub fn with_merge_settings(mut self, gap: Duration, cache: MergeCache) -> Self {
        self.merge_gap = gap;
        self.merge_cache = cache;
        self
    }

    pub fn store(&self) -> &ClusterStore {
        &self.store
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Fetch a new prompt and clear the translation fields
    pub async fn next_prompt(&mut self) -> &Prompt {
        let prompt = self.prompts.next().await;
        if let Some(notice) = &prompt.notice {
            warn!("⚠️ {}", notice);
        }
        info!("📝 New prompt: '{}'", prompt.text);
        self.draft.translation.clear();
        self.draft.recording = None;
        self.current.insert(prompt)
    }

    /// The prompt being translated, fetched on first use
    pub async fn current_prompt(&mut self) -> &Prompt {
        if self.current.is_none() {
            return self.next_prompt().await;
        }
        // Checked above
        self.current.get_or_insert_with(|| Prompt::new(""))
    }

    /// Speech for the current prompt
    pub async fn prompt_audio(&mut self) -> TranslatorResult<AudioBuffer> {
        let text = self.current_prompt().await.text.clone();
        self.synthesize(&text).await
    }

    async fn synthesize(&self, text: &str) -> TranslatorResult<AudioBuffer> {
        self.synthesizer
            .synthesize(text)
            .await
            .map_err(|e| TranslatorError::Tts(format!("{} failed: {e}", self.synthesizer.name())))
    }

    pub fn set_translation(&mut self, text: impl Into<String>) {
        self.draft.translation = text.into();
    }

    pub fn set_recording(&mut self, recording: Option<Recording>) {
        self.draft.recording = recording;
    }

    pub fn set_cluster(&mut self, cluster: impl Into<String>) {
        self.draft.cluster = cluster.into();
    }

    /// Save the form against the current prompt
    pub async fn save(&mut self) -> TranslatorResult<TranslationRecord> {
        let source_text = self.current_prompt().await.text.clone();
        let submission = Submission {
            source_text,
            translation_text: self.draft.translation.clone(),
            has_audio: self.draft.recording.is_some(),
            cluster: self.draft.cluster.clone(),
        };
        self.submit(&submission)
    }

    /// Validate a submission and add it to the store
    pub fn submit(&mut self, submission: &Submission) -> TranslatorResult<TranslationRecord> {
        let target_text = submission.resolve()?;
        self.store
            .add_translation(&submission.source_text, &target_text, &submission.cluster)?;
        info!(
            "✅ Saved '{}' -> '{}' in '{}'",
            submission.source_text, target_text, submission.cluster
        );
        Ok(TranslationRecord::new(
            submission.source_text.clone(),
            target_text,
        ))
    }

    pub fn delete(&mut self, cluster: &str, index: usize) -> TranslatorResult<TranslationRecord> {
        self.store.delete_translation(cluster, index)
    }

    pub fn export(&self) -> TranslatorResult<String> {
        self.store.export_json()
    }

    /// Write an export snapshot to `path`
    pub fn export_to(&self, path: &Path) -> TranslatorResult<()> {
        let json = self.export()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)?;
        info!("📤 Exported translations to {}", path.display());
        Ok(())
    }

    /// Prompt speech followed by the draft recording, cached per
    /// (prompt text, recording)
    pub async fn combined_audio(&mut self) -> TranslatorResult<Arc<AudioBuffer>> {
        let text = self.current_prompt().await.text.clone();
        let recording = self.draft.recording.as_ref().map(|r| r.buffer.clone());

        let key = MergeKey::new(text.as_bytes(), recording.as_ref().map(|r| r.bytes()));
        if let Some(hit) = self.merge_cache.get(&key) {
            return Ok(hit);
        }

        let speech = self.synthesize(&text).await?;
        let merged = merge_audio(&speech, recording.as_ref(), self.merge_gap)?;
        Ok(self.merge_cache.insert(key, merged))
    }
}
