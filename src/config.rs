use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "IBIBIO_TRANSLATOR_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Store
    pub store_path: String,

    // Prompts
    pub prompt_source: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub ollama_api_key_env: String,
    pub ollama_timeout_secs: u64,

    // Speech
    pub tts_engine: String,
    pub piper_voice: String,
    pub piper_voice_dir: String,

    // Audio
    pub merge_gap_ms: u64,
    pub merge_cache_ttl_secs: u64,
    pub recordings_dir: String,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: crate::store::DEFAULT_STORE_FILE.to_string(),
            prompt_source: "word_list".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama2".to_string(),
            ollama_api_key_env: "OLLAMA_API_KEY".to_string(),
            ollama_timeout_secs: 10,
            tts_engine: "espeak".to_string(),
            piper_voice: "en_GB-cori-high".to_string(),
            piper_voice_dir: dirs::data_dir()
                .unwrap_or_default()
                .join("ibibio-translator/voices")
                .to_string_lossy()
                .to_string(),
            merge_gap_ms: 500,
            merge_cache_ttl_secs: 180,
            recordings_dir: dirs::data_dir()
                .unwrap_or_default()
                .join("ibibio-translator/recordings")
                .to_string_lossy()
                .to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load config from file, or defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read(config_path)?;
        match serde_json::from_slice(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                // Keep the broken file around for inspection
                let mut backup_name = config_path.file_name().unwrap_or_default().to_os_string();
                backup_name.push(".corrupt");
                let backup_path = config_path.with_file_name(backup_name);
                let _ = std::fs::rename(config_path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// API key for the remote prompt service, read from the configured
    /// environment variable
    pub fn ollama_api_key(&self) -> Option<String> {
        std::env::var(&self.ollama_api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    pub fn merge_gap(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.merge_gap_ms)
    }

    pub fn merge_cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.merge_cache_ttl_secs)
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ibibio-translator")
        .join("config.json")
}
