mod entity;
mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

use crate::error::{CommonError, Result};
use async_trait::async_trait;

/// Durable string-keyed store backing the usage counters.
///
/// Values are stored as strings; numeric accessors parse on the way out and
/// treat an absent key as zero.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Writes the value only when the key does not exist yet.
    async fn set_default_if_absent(&self, key: &str, value: &str) -> Result<()>;

    async fn get_long(&self, key: &str) -> Result<i64> {
        match self.get(key).await? {
            None => Ok(0),
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| CommonError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        }
    }

    async fn set_long(&self, key: &str, value: i64) -> Result<()> {
        self.set_string(key, &value.to_string()).await
    }
}
