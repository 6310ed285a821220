use crate::content::ContentSource;
use crate::error::StoreError;
use crate::store::{StoreResult, UserStore};
use crate::types::{ContentKind, UserRecord, VisitorId};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed user records and stage content.
///
/// Users live in `users`; content lives in one table per kind (`title`,
/// `content`), each keyed by `path`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to PostgreSQL and initialize schema
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(format!("postgres connect failed: {e}")))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                passphrase TEXT NOT NULL,
                stage TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS title (
                path TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS content (
                path TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );
            "#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Query(format!("postgres schema create failed: {e}")))?;
        }

        Ok(())
    }

    fn decode_user(row: &PgRow) -> Result<UserRecord, StoreError> {
        let decode = |column: &str, e: sqlx::Error| {
            StoreError::InvalidData(format!("postgres decode {column} failed: {e}"))
        };
        let id: Uuid = row.try_get("id").map_err(|e| decode("id", e))?;
        Ok(UserRecord {
            id: VisitorId::from(id),
            name: row.try_get("name").map_err(|e| decode("name", e))?,
            passphrase: row
                .try_get("passphrase")
                .map_err(|e| decode("passphrase", e))?,
            stage: row.try_get("stage").map_err(|e| decode("stage", e))?,
            created_at: row
                .try_get("created_at")
                .map_err(|e| decode("created_at", e))?,
            updated_at: row
                .try_get("updated_at")
                .map_err(|e| decode("updated_at", e))?,
        })
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn create(&self, record: UserRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, passphrase, stage, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.name)
        .bind(&record.passphrase)
        .bind(&record.stage)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code == UNIQUE_VIOLATION)
                .unwrap_or(false);
            if duplicate {
                StoreError::Duplicate(record.id.to_string())
            } else {
                StoreError::Query(format!("postgres insert failed: {e}"))
            }
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &VisitorId) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, name, passphrase, stage, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(format!("postgres select failed: {e}")))?;

        row.as_ref().map(Self::decode_user).transpose()
    }

    async fn update_stage(&self, id: &VisitorId, stage: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET stage = $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(stage)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("postgres update failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentSource for PostgresStore {
    async fn fetch(&self, kind: ContentKind, path: &str) -> Result<Option<String>, StoreError> {
        // Table names come from the closed ContentKind set.
        let statement = format!("SELECT body FROM {} WHERE path = $1", kind.name());
        let row = sqlx::query(&statement)
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("postgres {kind} select failed: {e}")))?;

        row.map(|row| {
            row.try_get::<String, _>("body")
                .map_err(|e| StoreError::InvalidData(format!("postgres decode body failed: {e}")))
        })
        .transpose()
    }
}
