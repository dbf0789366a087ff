use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use arbor_core::error::CacheError;
use arbor_core::ports::CacheStore;

/// JSON view over a [`CacheStore`] with a per-call deadline.
#[derive(Clone)]
pub struct CacheClient {
    store: Arc<dyn CacheStore>,
    timeout: Duration,
}

impl CacheClient {
    pub fn new(store: Arc<dyn CacheStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.bounded(self.store.get(key)).await
    }

    pub async fn set_raw(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.bounded(self.store.set(key, value, ttl)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(raw) = self.get_raw(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| CacheError::Codec(err.to_string()))
    }

    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value).map_err(|err| CacheError::Codec(err.to_string()))?;
        self.set_raw(key, raw, ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.bounded(self.store.delete(key)).await
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| CacheError::Timeout)?
    }
}
