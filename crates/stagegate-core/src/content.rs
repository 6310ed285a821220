use crate::error::{GateError, StoreError};
use crate::stage::EMPTY_PATH;
use crate::types::{ContentEntry, ContentKind};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Read-only source of stage content keyed by (kind, path).
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, kind: ContentKind, path: &str) -> Result<Option<String>, StoreError>;
}

/// In-memory content catalog
#[derive(Debug, Clone, Default)]
pub struct MemoryContentSource {
    entries: HashMap<(ContentKind, String), String>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ContentEntry>) -> Self {
        let mut source = Self::new();
        for entry in entries {
            source.insert(entry);
        }
        source
    }

    pub fn insert(&mut self, entry: ContentEntry) {
        self.entries.insert((entry.kind, entry.path), entry.body);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ContentSource for MemoryContentSource {
    async fn fetch(&self, kind: ContentKind, path: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(&(kind, path.to_string())).cloned())
    }
}

/// Resolves stage content with the `/empty` fallback and an optional
/// read-through cache.
#[derive(Clone)]
pub struct ContentResolver {
    source: Arc<dyn ContentSource>,
    cache: Option<Arc<DashMap<(ContentKind, String), String>>>,
}

impl ContentResolver {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            cache: None,
        }
    }

    pub fn cached(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            cache: Some(Arc::new(DashMap::new())),
        }
    }

    pub async fn resolve(&self, kind: ContentKind, path: &str) -> Result<String, GateError> {
        let key = (kind, path.to_string());
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(&key) {
                return Ok(body.value().clone());
            }
        }

        let body = match self.fetch(kind, path).await? {
            Some(body) => body,
            None => {
                debug!(kind = %kind, path, "no exact content entry, using fallback");
                self.fetch(kind, EMPTY_PATH)
                    .await?
                    .ok_or_else(|| GateError::ContentUnavailable {
                        kind,
                        path: path.to_string(),
                    })?
            }
        };

        if let Some(cache) = &self.cache {
            cache.insert(key, body.clone());
        }
        Ok(body)
    }

    async fn fetch(&self, kind: ContentKind, path: &str) -> Result<Option<String>, GateError> {
        self.source.fetch(kind, path).await.map_err(|e| {
            GateError::StageLookupFailed(format!("{kind} content lookup for '{path}' failed: {e}"))
        })
    }
}

/// Fills `{{name}}` and `{{processedName}}` in a trusted HTML fragment.
///
/// The fragment itself is not escaped; the substituted values are.
pub fn render_fragment(body: &str, name: Option<&str>) -> String {
    let name = name.unwrap_or_default();
    let processed = processed_name(name);
    body.replace("{{name}}", &escape_html(name))
        .replace("{{processedName}}", &escape_html(&processed))
}

/// First word of the name, lowercased.
pub fn processed_name(name: &str) -> String {
    name.split_whitespace()
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}
