use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use arbor_core::error::CacheError;
use arbor_core::ports::CacheStore;

/// Redis-backed cache. Keys are prefixed with a namespace so several
/// deployments can share one server.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    namespace: String,
}

impl RedisCacheStore {
    pub async fn connect(url: &str, namespace: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = ConnectionManager::new(client).await.map_err(unavailable)?;
        Ok(Self {
            conn,
            namespace: namespace.to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{key}", self.namespace)
    }
}

fn unavailable(err: redis::RedisError) -> CacheError {
    CacheError::Unavailable(err.to_string())
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.key(key)).await.map_err(unavailable)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let key = self.key(key);
        match ttl {
            Some(ttl) => {
                let seconds = ttl.as_secs().max(1);
                let _: () = conn.set_ex(key, value, seconds).await.map_err(unavailable)?;
            }
            None => {
                let _: () = conn.set(key, value).await.map_err(unavailable)?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.key(key)).await.map_err(unavailable)?;
        Ok(())
    }
}
