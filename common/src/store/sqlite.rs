use std::fs;
use std::path::Path;

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Set, Statement};
use tracing::info;

use super::entity;
use super::KvStore;
use crate::error::Result;

/// SQLite-backed store holding one row per key.
pub struct SqliteKvStore {
    db: DatabaseConnection,
}

impl SqliteKvStore {
    pub async fn open<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let database_path = database_path.as_ref();

        if let Some(parent) = database_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let db = Database::connect(&database_url).await?;

        let create_table_sql = r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        "#;
        db.execute(Statement::from_string(
            db.get_database_backend(),
            create_table_sql.to_string(),
        ))
        .await?;

        info!(
            "Connected to SQLite key-value store: {}",
            database_path.display()
        );

        Ok(Self { db })
    }

    fn row(key: &str, value: &str) -> entity::ActiveModel {
        entity::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(chrono::Utc::now().naive_utc()),
        }
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = entity::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await?;
        Ok(row.map(|r| r.value))
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        entity::Entity::insert(Self::row(key, value))
            .on_conflict(
                OnConflict::column(entity::Column::Key)
                    .update_columns([entity::Column::Value, entity::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn set_default_if_absent(&self, key: &str, value: &str) -> Result<()> {
        entity::Entity::insert(Self::row(key, value))
            .on_conflict(
                OnConflict::column(entity::Column::Key)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }
}
