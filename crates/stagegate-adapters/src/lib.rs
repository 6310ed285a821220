//! Passphrase generator adapters for the stage gate.

#![deny(unsafe_code)]

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use stagegate_core::{
    Passphrase, PassphraseError, PassphraseGenerator, MAX_WORD_LEN, MIN_WORD_LEN,
    PASSPHRASE_WORDS,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

const DEFAULT_WORDS: &str = include_str!("words.txt");

/// Picks three distinct words from a word list.
///
/// Words outside 4..=12 characters, or containing anything other than ASCII
/// letters, are dropped when the list is loaded.
#[derive(Debug)]
pub struct WordListGenerator {
    words: Vec<String>,
    rng: Mutex<StdRng>,
}

impl WordListGenerator {
    /// Generator over the bundled word list.
    pub fn bundled() -> Self {
        Self::from_words(DEFAULT_WORDS.lines(), StdRng::from_entropy())
    }

    /// Deterministic generator for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self::from_words(DEFAULT_WORDS.lines(), StdRng::seed_from_u64(seed))
    }

    /// Loads one word per line from `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PassphraseError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            PassphraseError::Backend(format!("cannot read word list '{}': {e}", path.display()))
        })?;
        let generator = Self::from_words(text.lines(), StdRng::from_entropy());
        debug!(path = %path.display(), words = generator.words.len(), "loaded word list");
        Ok(generator)
    }

    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>, rng: StdRng) -> Self {
        let words: BTreeSet<String> = words
            .into_iter()
            .map(|word| word.trim().to_lowercase())
            .filter(|word| is_usable(word))
            .collect();
        Self {
            words: words.into_iter().collect(),
            rng: Mutex::new(rng),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn is_usable(word: &str) -> bool {
    (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&word.len())
        && word.chars().all(|c| c.is_ascii_alphabetic())
}

#[async_trait]
impl PassphraseGenerator for WordListGenerator {
    fn name(&self) -> &'static str {
        "word-list"
    }

    async fn generate(&self) -> Result<Passphrase, PassphraseError> {
        if self.words.len() < PASSPHRASE_WORDS {
            return Err(PassphraseError::Exhausted(format!(
                "need {PASSPHRASE_WORDS} distinct words, list has {}",
                self.words.len()
            )));
        }

        let picked: Vec<String> = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| PassphraseError::Backend("rng lock poisoned".to_string()))?;
            self.words
                .choose_multiple(&mut *rng, PASSPHRASE_WORDS)
                .cloned()
                .collect()
        };

        Passphrase::from_words(picked)
    }
}

/// Deterministic failing generator useful for chaos testing.
#[derive(Debug, Clone)]
pub struct AlwaysFailGenerator {
    reason: String,
}

impl AlwaysFailGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl PassphraseGenerator for AlwaysFailGenerator {
    fn name(&self) -> &'static str {
        "always-fail"
    }

    async fn generate(&self) -> Result<Passphrase, PassphraseError> {
        Err(PassphraseError::Backend(self.reason.clone()))
    }
}
