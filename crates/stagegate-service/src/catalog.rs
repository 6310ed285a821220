//! Stage content seeding for the in-memory backend.

use crate::error::{ServiceError, ServiceResult};
use stagegate_core::{ContentEntry, ContentKind, MemoryContentSource, StagePlan, EMPTY_PATH, ROOT_PATH};
use std::fs;
use std::path::Path;
use tracing::info;

/// Reads a JSON array of `{"path", "kind", "body"}` entries.
pub fn load_catalog(path: impl AsRef<Path>) -> ServiceResult<MemoryContentSource> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| {
        ServiceError::Catalog(format!("cannot read '{}': {e}", path.display()))
    })?;
    let entries: Vec<ContentEntry> = serde_json::from_str(&raw).map_err(|e| {
        ServiceError::Catalog(format!("invalid catalog '{}': {e}", path.display()))
    })?;
    info!(path = %path.display(), entries = entries.len(), "loaded content catalog");
    Ok(MemoryContentSource::from_entries(entries))
}

/// Built-in content for every stage of `plan`, plus the `/empty` fallback.
pub fn builtin_catalog(plan: &StagePlan) -> MemoryContentSource {
    let pages = [
        (
            ROOT_PATH,
            "Welcome",
            "<p>Tell us your name to receive a passphrase.</p>",
        ),
        (
            plan.registered.as_str(),
            "Hello {{name}}",
            "<p>Keep your passphrase safe, {{processedName}}. Do you want to go on?</p>",
        ),
        (
            plan.accepted.as_str(),
            "You are in",
            "<p>Thanks, {{name}}. You have reached the final stage.</p>",
        ),
        (EMPTY_PATH, "Stagegate", "<p>There is nothing here yet.</p>"),
    ];

    MemoryContentSource::from_entries(pages.into_iter().flat_map(|(path, title, body)| {
        [
            ContentEntry::new(path, ContentKind::Title, title),
            ContentEntry::new(path, ContentKind::Content, body),
        ]
    }))
}
