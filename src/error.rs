//! Translator Error Types
//!
//! Centralized error handling for the store and its collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the translator
#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Index {index} out of range for cluster '{cluster}' ({len} records)")]
    IndexOutOfRange {
        cluster: String,
        index: usize,
        len: usize,
    },

    #[error("Failed to persist translations to {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Translation store {} is corrupt: {source}", .path.display())]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("TTS engine error: {0}")]
    Tts(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for translator operations
pub type TranslatorResult<T> = Result<T, TranslatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_out_of_range_message() {
        let err = TranslatorError::IndexOutOfRange {
            cluster: "greetings".to_string(),
            index: 5,
            len: 2,
        };
        assert_eq!(
            err.to_string(),
            "Index 5 out of range for cluster 'greetings' (2 records)"
        );
    }

    #[test]
    fn test_persistence_message_names_path() {
        let err = TranslatorError::Persistence {
            path: PathBuf::from("translations.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("translations.json"));
    }
}
