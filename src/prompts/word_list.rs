//! Prompts drawn from a fixed local list

use super::{Prompt, PromptProvider};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

pub const WORDS: &[&str] = &["apple", "banana", "computer", "house", "sun"];

pub const SENTENCES: &[&str] = &[
    "The quick brown fox jumps over the lazy dog.",
    "A journey of a thousand miles begins with a single step.",
    "To be or not to be, that is the question.",
];

/// Picks words or sentences with equal odds, then uniformly within the list
#[derive(Debug)]
pub struct WordListPrompts {
    rng: Mutex<StdRng>,
}

impl Default for WordListPrompts {
    fn default() -> Self {
        Self::new()
    }
}

impl WordListPrompts {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence, for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn pick(&self) -> &'static str {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let list = if rng.gen_bool(0.5) { WORDS } else { SENTENCES };
        // Lists are non-empty constants
        list.choose(&mut *rng).copied().unwrap_or(WORDS[0])
    }
}

#[async_trait]
impl PromptProvider for WordListPrompts {
    async fn next(&self) -> Prompt {
        Prompt::new(self.pick())
    }

    fn name(&self) -> &str {
        "word_list"
    }
}
