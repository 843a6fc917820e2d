//! SQLite storage for credential metadata.
//!
//! Records are kept as JSON documents in a single `credentials` table with
//! `id` as the primary key; schema is created and versioned by embedded
//! migrations.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};

use super::StoreError;
use crate::record::CredentialRecord;

/// SQLite-backed credential storage.
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    /// Open the database at `path`, creating it if absent, and bring the
    /// schema up to date.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| StoreError::Open(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::info!(path = %path.display(), "credential store opened");
        Ok(store)
    }

    /// Run embedded schema migrations.
    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Open(e.to_string()))
    }

    /// Close the underlying connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Upsert a record by its `id`.
    pub async fn put(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let document =
            serde_json::to_string(record).map_err(|e| StoreError::Write(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO credentials (id, document, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (id) DO UPDATE SET
                document = excluded.document,
                created_at = excluded.created_at
            "#,
        )
        .bind(&record.id)
        .bind(&document)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Write(e.to_string()))?;

        tracing::debug!(credential_id = %record.id, "credential stored");
        Ok(())
    }

    /// Every stored record, in storage-native order.
    pub async fn get_all(&self) -> Result<Vec<CredentialRecord>, StoreError> {
        let rows =
            sqlx::query_as::<_, CredentialRow>("SELECT id, document, created_at FROM credentials")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Read(e.to_string()))?;

        rows.into_iter().map(CredentialRow::into_record).collect()
    }

    /// The record stored under `id`, if any.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, document, created_at FROM credentials WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Read(e.to_string()))?;

        row.map(CredentialRow::into_record).transpose()
    }

    /// Delete the record under `id`, reporting whether one existed.
    pub async fn delete_by_id(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM credentials WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Total stored records.
    pub async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credentials")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;

        Ok(count as usize)
    }
}

/// Database row for credentials.
#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: String,
    document: String,
    #[allow(dead_code)]
    created_at: i64,
}

impl CredentialRow {
    fn into_record(self) -> Result<CredentialRecord, StoreError> {
        let record: CredentialRecord = serde_json::from_str(&self.document)
            .map_err(|e| StoreError::Read(format!("corrupt document for {}: {e}", self.id)))?;
        Ok(record)
    }
}

impl std::fmt::Debug for SqliteCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCredentialStore")
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}
