use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::cache::CacheLayer;
use crate::cache::invalidation::InvalidationCoordinator;
use crate::cli::{CacheBackend, Cli, StoreBackend};
use crate::config::AppConfig;
use crate::jobs::BackgroundTasks;
use crate::service::{CommentService, PostService};
use crate::state::{AppState, Backends};
use arbor_core::error::CacheError;
use arbor_core::ports::{CacheStore, CommentStore, PostStore};
use arbor_infra::cache::{DisabledCacheStore, MemoryCacheStore, RedisCacheStore};
use arbor_infra::db::{DbPoolError, PgStore, connect_lazy};
use arbor_infra::memory::MemoryStore;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("{0} must be set for the selected backend")]
    MissingSetting(&'static str),
    #[error("db pool error: {0}")]
    Db(#[from] DbPoolError),
    #[error("cache connect error: {0}")]
    Cache(#[from] CacheError),
}

/// Concrete collaborators chosen for this process.
pub struct Backing {
    pub comments: Arc<dyn CommentStore>,
    pub posts: Arc<dyn PostStore>,
    pub cache: Arc<dyn CacheStore>,
    pub memory_cache: Option<Arc<MemoryCacheStore>>,
    pub backends: Backends,
}

pub async fn build_state(config: AppConfig, cli: &Cli) -> Result<AppState, WiringError> {
    let (comments, posts): (Arc<dyn CommentStore>, Arc<dyn PostStore>) = match cli.store {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(WiringError::MissingSetting("ARBOR_DATABASE_URL"))?;
            let store = Arc::new(PgStore::new(connect_lazy(url, config.db_max_connections)?));
            let comments: Arc<dyn CommentStore> = store.clone();
            (comments, store)
        }
        StoreBackend::Memory => {
            let store = Arc::new(MemoryStore::new());
            let comments: Arc<dyn CommentStore> = store.clone();
            (comments, store)
        }
    };

    let mut memory_cache = None;
    let cache: Arc<dyn CacheStore> = match cli.cache {
        CacheBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or(WiringError::MissingSetting("ARBOR_REDIS_URL"))?;
            Arc::new(RedisCacheStore::connect(url, &config.cache_namespace).await?)
        }
        CacheBackend::Memory => {
            let store = Arc::new(MemoryCacheStore::new());
            memory_cache = Some(store.clone());
            store
        }
        CacheBackend::Disabled => Arc::new(DisabledCacheStore),
    };

    info!(store = cli.store.name(), cache = cli.cache.name(), "backends selected");
    Ok(assemble(
        config,
        Backing {
            comments,
            posts,
            cache,
            memory_cache,
            backends: Backends {
                store: cli.store.name(),
                cache: cli.cache.name(),
            },
        },
    ))
}

pub fn assemble(config: AppConfig, backing: Backing) -> AppState {
    let timeouts = config.timeouts();
    let background = BackgroundTasks::new();
    let cache = CacheLayer::new(backing.cache, config.cache_timeout, config.cache_ttls());
    let invalidation = InvalidationCoordinator::new(
        cache.clone(),
        backing.comments.clone(),
        background.clone(),
        timeouts,
    );
    let comments = CommentService::new(
        backing.comments,
        backing.posts.clone(),
        cache.clone(),
        invalidation.clone(),
        background.clone(),
        timeouts,
    );
    let posts = PostService::new(backing.posts, cache, invalidation, background.clone(), timeouts);
    AppState {
        config: Arc::new(config),
        comments,
        posts,
        background,
        memory_cache: backing.memory_cache,
        backends: backing.backends,
    }
}
