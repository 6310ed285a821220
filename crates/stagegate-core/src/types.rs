use crate::error::PassphraseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque visitor identifier, generated at first contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitorId(Uuid);

impl VisitorId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for VisitorId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Persisted visitor identity and progress. `stage` is the only mutable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: VisitorId,
    pub name: String,
    pub passphrase: String,
    pub stage: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(
        id: VisitorId,
        name: impl Into<String>,
        passphrase: impl Into<String>,
        stage: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            passphrase: passphrase.into(),
            stage: stage.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Kind of renderable content attached to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Title,
    Content,
}

impl ContentKind {
    pub const ALL: [ContentKind; 2] = [ContentKind::Title, ContentKind::Content];

    pub fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single (path, kind) content fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub path: String,
    pub kind: ContentKind,
    pub body: String,
}

impl ContentEntry {
    pub fn new(path: impl Into<String>, kind: ContentKind, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            body: body.into(),
        }
    }
}

pub const PASSPHRASE_WORDS: usize = 3;
pub const MIN_WORD_LEN: usize = 4;
pub const MAX_WORD_LEN: usize = 12;

/// Three-word passphrase shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passphrase {
    words: Vec<String>,
}

impl Passphrase {
    /// Validates word count and word lengths.
    pub fn from_words(words: Vec<String>) -> Result<Self, PassphraseError> {
        if words.len() != PASSPHRASE_WORDS {
            return Err(PassphraseError::Malformed(format!(
                "expected {PASSPHRASE_WORDS} words, got {}",
                words.len()
            )));
        }
        for word in &words {
            let len = word.chars().count();
            if !(MIN_WORD_LEN..=MAX_WORD_LEN).contains(&len)
                || word.chars().any(char::is_whitespace)
            {
                return Err(PassphraseError::Malformed(format!(
                    "word '{word}' must be {MIN_WORD_LEN}-{MAX_WORD_LEN} characters without spaces"
                )));
            }
        }
        Ok(Self { words })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl fmt::Display for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.words.join(" "))
    }
}

/// Parsed challenge form answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeAnswer {
    Accept,
    Decline,
    Other(String),
}

impl ChallengeAnswer {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "yes" => Self::Accept,
            "no" => Self::Decline,
            other => Self::Other(other.to_string()),
        }
    }
}
