//! Cached key-value settings.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::AssistantConfig;
use crate::error::StoreResult;
use crate::store::SettingsStore;

pub struct Settings {
    store: Arc<dyn SettingsStore>,
    values: RwLock<HashMap<String, String>>,
}

impl Settings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_values(store, HashMap::new())
    }

    pub fn with_values(store: Arc<dyn SettingsStore>, values: HashMap<String, String>) -> Self {
        Self {
            store,
            values: RwLock::new(values),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.values.read().await.get(key).cloned()
    }

    /// The interpreter credential stored under `config.credential_key`.
    /// Blank values count as absent.
    pub async fn credential(&self, config: &AssistantConfig) -> Option<String> {
        self.get(&config.credential_key)
            .await
            .filter(|value| !value.trim().is_empty())
    }

    pub async fn all(&self) -> HashMap<String, String> {
        self.values.read().await.clone()
    }

    pub async fn refresh(&self) -> StoreResult<()> {
        let fresh = self.store.all().await?;
        *self.values.write().await = fresh;
        Ok(())
    }

    /// Upsert in the store; the cache changes only on success.
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.store.set(key, value).await.inspect_err(|e| {
            tracing::warn!(key, error = %e, "settings write failed");
        })?;
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
