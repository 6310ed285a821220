use crate::types::{UserRecord, VisitorId};
use serde::{Deserialize, Serialize};

/// Per-visitor ephemeral state for one browser session.
///
/// Holds a denormalized copy of the visitor record; the persisted record stays
/// authoritative and any divergence on `stage` is treated as tampering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub id: Option<VisitorId>,
    pub name: Option<String>,
    pub passphrase: Option<String>,
    pub stage: Option<String>,
    #[serde(default)]
    pub noaccept: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }

    /// Clears every field.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Adopts identity and stage from a freshly persisted record.
    pub fn bind(&mut self, record: &UserRecord) {
        self.id = Some(record.id);
        self.name = Some(record.name.clone());
        self.passphrase = Some(record.passphrase.clone());
        self.stage = Some(record.stage.clone());
    }
}
