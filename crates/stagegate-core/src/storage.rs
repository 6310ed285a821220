use crate::content::{ContentSource, MemoryContentSource};
use crate::error::StoreError;
use crate::postgres::PostgresStore;
use crate::store::{MemoryUserStore, UserStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Persistence backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Keep users in process memory and serve content from a catalog.
    Memory,
    /// Persist users and read content from PostgreSQL.
    Postgres {
        url: String,
        #[serde(default = "default_pool_size")]
        max_connections: u32,
        #[serde(default = "default_connect_timeout")]
        connect_timeout_secs: u64,
    },
}

impl StorageConfig {
    pub fn postgres(url: impl Into<String>, max_connections: u32) -> Self {
        Self::Postgres {
            url: url.into(),
            max_connections,
            connect_timeout_secs: default_connect_timeout(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Memory
    }
}

fn default_pool_size() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    5
}

/// The user store and content source selected by configuration.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserStore>,
    pub content: Arc<dyn ContentSource>,
    pub backend: &'static str,
}

impl Storage {
    /// Connects the configured backend. `catalog` is only used in memory mode.
    pub async fn bootstrap(
        config: &StorageConfig,
        catalog: MemoryContentSource,
    ) -> Result<Self, StoreError> {
        match config {
            StorageConfig::Memory => {
                info!(entries = catalog.len(), "using in-memory storage");
                Ok(Self::memory(MemoryUserStore::new(), catalog))
            }
            StorageConfig::Postgres {
                url,
                max_connections,
                connect_timeout_secs,
            } => {
                let store =
                    Arc::new(PostgresStore::connect(url, *max_connections, *connect_timeout_secs).await?);
                info!(max_connections, "connected to postgres storage");
                Ok(Self {
                    users: store.clone(),
                    content: store,
                    backend: config.label(),
                })
            }
        }
    }

    pub fn memory(users: MemoryUserStore, catalog: MemoryContentSource) -> Self {
        Self {
            users: Arc::new(users),
            content: Arc::new(catalog),
            backend: "memory",
        }
    }
}
