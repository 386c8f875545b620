//! Prompt Providers
//!
//! Supply the English word or sentence the user is asked to translate.

use crate::config::Config;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub mod ollama;
pub mod word_list;

/// A prompt to translate, with an optional message for the user when the
/// provider had to degrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub notice: Option<String>,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            notice: None,
        }
    }
}

/// Trait for prompt sources.
///
/// Providers never fail: problems are reported through `Prompt::notice`
/// and a placeholder text.
#[async_trait]
pub trait PromptProvider: Send + Sync + std::fmt::Debug {
    async fn next(&self) -> Prompt;

    /// Get the provider name
    fn name(&self) -> &str;
}

/// Factory to create the configured prompt provider
pub fn create_provider(config: &Config) -> Arc<dyn PromptProvider> {
    let provider: Arc<dyn PromptProvider> = match config.prompt_source.as_str() {
        "word_list" | "local" => Arc::new(word_list::WordListPrompts::new()),
        "ollama" => Arc::new(ollama::OllamaPrompts::new(config)),
        other => {
            warn!("  - Unknown prompt source '{}', using word list", other);
            Arc::new(word_list::WordListPrompts::new())
        }
    };
    info!("📝 Prompt provider '{}' ready", provider.name());
    provider
}
