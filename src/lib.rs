//! Ibibio Translator Library
//!
//! Collects English to Ibibio translations grouped into named clusters,
//! persisted to a JSON file, with speech for each prompt.

pub mod audio;
pub mod config;
pub mod error;
pub mod prompts;
pub mod session;
pub mod store;
pub mod tts;

pub use error::{TranslatorError, TranslatorResult};
pub use store::{ClusterStore, TranslationRecord};
