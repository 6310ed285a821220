use crate::error::StoreError;
use crate::types::{UserRecord, VisitorId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent mapping from visitor id to identity and stage.
///
/// Every operation touches exactly one record and is atomic on its own; there
/// are no multi-record transactions and `update_stage` is last-write-wins.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new record. Fails with `StoreError::Duplicate` if the id exists.
    async fn create(&self, record: UserRecord) -> StoreResult<()>;

    /// Fetch a record by id.
    async fn find_by_id(&self, id: &VisitorId) -> StoreResult<Option<UserRecord>>;

    /// Overwrite the stage of an existing record.
    async fn update_stage(&self, id: &VisitorId, stage: &str) -> StoreResult<()>;
}

/// In-memory user store for development and testing
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<VisitorId, UserRecord>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Snapshot of all records, oldest first.
    pub async fn records(&self) -> Vec<UserRecord> {
        let mut records: Vec<UserRecord> = self.users.read().await.values().cloned().collect();
        records.sort_by_key(|record| record.created_at);
        records
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, record: UserRecord) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id.to_string()));
        }
        users.insert(record.id, record);
        Ok(())
    }

    async fn find_by_id(&self, id: &VisitorId) -> StoreResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn update_stage(&self, id: &VisitorId, stage: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let record = users
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.stage = stage.to_string();
        record.updated_at = Utc::now();
        Ok(())
    }
}
