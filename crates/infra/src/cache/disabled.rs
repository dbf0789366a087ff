use std::time::Duration;

use async_trait::async_trait;

use arbor_core::error::CacheError;
use arbor_core::ports::CacheStore;

/// Cache that is never reachable. Every read is a miss for the callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCacheStore;

#[async_trait]
impl CacheStore for DisabledCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("cache disabled".to_string()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("cache disabled".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("cache disabled".to_string()))
    }
}
