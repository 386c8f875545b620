//! Combined prompt + translation audio
//!
//! Joins the synthesized prompt and the user's recording with a short
//! silence between them. Results are cached for a fixed time after they
//! are produced.

use super::{AudioBuffer, Pcm};
use crate::error::TranslatorResult;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_GAP: Duration = Duration::from_millis(500);
pub const DEFAULT_TTL: Duration = Duration::from_secs(180);

/// `primary + gap + secondary`, encoded as WAV in the primary's layout.
/// Without a secondary the primary is re-encoded alone.
pub fn merge_audio(
    primary: &AudioBuffer,
    secondary: Option<&AudioBuffer>,
    gap: Duration,
) -> TranslatorResult<AudioBuffer> {
    let mut combined = primary.decode()?;

    if let Some(secondary) = secondary {
        let tail = secondary
            .decode()?
            .convert(combined.channels, combined.sample_rate)?;
        let silence = Pcm::silence(gap, combined.channels, combined.sample_rate)?;

        debug!(
            "🎚️ Merging {} + {} silence + {} samples",
            combined.samples.len(),
            silence.samples.len(),
            tail.samples.len()
        );
        combined.samples.extend(silence.samples);
        combined.samples.extend(tail.samples);
    }

    combined.encode_wav()
}

/// Cache identity of a merge: the prompt and the optional recording
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeKey {
    primary: [u8; 32],
    secondary: Option<[u8; 32]>,
}

impl MergeKey {
    pub fn new(primary: &[u8], secondary: Option<&[u8]>) -> Self {
        Self {
            primary: *blake3::hash(primary).as_bytes(),
            secondary: secondary.map(|bytes| *blake3::hash(bytes).as_bytes()),
        }
    }
}

/// Merged audio kept for a fixed time after insertion. No capacity bound.
#[derive(Clone)]
pub struct MergeCache {
    cache: Cache<MergeKey, Arc<AudioBuffer>>,
}

impl std::fmt::Debug for MergeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl Default for MergeCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl MergeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }

    pub fn get(&self, key: &MergeKey) -> Option<Arc<AudioBuffer>> {
        let hit = self.cache.get(key);
        if hit.is_some() {
            debug!("🎚️ Merge cache hit");
        }
        hit
    }

    pub fn insert(&self, key: MergeKey, merged: AudioBuffer) -> Arc<AudioBuffer> {
        let merged = Arc::new(merged);
        self.cache.insert(key, merged.clone());
        merged
    }

    /// Merge through the cache, keyed by the buffers' contents
    pub fn merge(
        &self,
        primary: &AudioBuffer,
        secondary: Option<&AudioBuffer>,
        gap: Duration,
    ) -> TranslatorResult<Arc<AudioBuffer>> {
        let key = MergeKey::new(primary.bytes(), secondary.map(|s| s.bytes()));
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let merged = merge_audio(primary, secondary, gap)?;
        Ok(self.insert(key, merged))
    }

    /// Live entries, after pending expirations are applied
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
