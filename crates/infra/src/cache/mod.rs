mod disabled;
mod memory;
mod redis_store;

pub use disabled::DisabledCacheStore;
pub use memory::MemoryCacheStore;
pub use redis_store::RedisCacheStore;
