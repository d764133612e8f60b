use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::debug;

use super::SettingsStore;

/// Settings persisted in a SQLite `settings` table.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

/// Stored setting row.
#[derive(Debug, Clone, sqlx::FromRow)]
struct StoredSetting {
    key: String,
    value: String,
}

impl SqliteSettingsStore {
    /// Connect and create the schema if needed.
    pub async fn new(database_url: &str) -> Result<Self> {
        // One connection: the calculator is single-task, and `sqlite::memory:`
        // gives every connection its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to settings database {}", database_url))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create settings table")?;

        Ok(())
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value.map(|(v,)| v))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let result = sqlx::query("DELETE FROM settings")
            .execute(&self.pool)
            .await?;

        debug!(removed = result.rows_affected(), "Cleared settings");
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, String)>> {
        let rows: Vec<StoredSetting> =
            sqlx::query_as("SELECT key, value FROM settings ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|row| (row.key, row.value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteSettingsStore {
        SqliteSettingsStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = memory_store().await;

        assert_eq!(store.get("leverage").await.unwrap(), None);

        store.set("leverage", "20").await.unwrap();
        store.set("leverage", "50").await.unwrap();
        store.set("direction", "short").await.unwrap();

        assert_eq!(store.get("leverage").await.unwrap().as_deref(), Some("50"));
        assert_eq!(
            store.entries().await.unwrap(),
            vec![
                ("direction".to_string(), "short".to_string()),
                ("leverage".to_string(), "50".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_clear_removes_unrelated_keys() {
        let store = memory_store().await;
        store.set("entry", "100").await.unwrap();
        store.set("unrelated", "kept?").await.unwrap();

        store.clear().await.unwrap();

        assert!(store.entries().await.unwrap().is_empty());
        assert_eq!(store.get("unrelated").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reopen_keeps_schema() {
        let store = memory_store().await;
        store.run_migrations().await.unwrap();
        store.set("exit", "110").await.unwrap();
        assert_eq!(store.get("exit").await.unwrap().as_deref(), Some("110"));
    }
}
