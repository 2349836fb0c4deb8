use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::KvStore;
use crate::error::Result;

/// In-memory store for tests and scripted harness runs.
///
/// Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.lock().get(key).cloned())
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.inner.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_default_if_absent(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
        Ok(())
    }
}
