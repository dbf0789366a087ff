pub mod comments;
pub mod posts;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use arbor_core::domain::Id;
use arbor_core::error::{CoreError, StoreError, ValidationError};
use arbor_core::ports::StoreResult;

pub use comments::CommentService;
pub use posts::PostService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("parent comment {0} does not exist")]
    InvalidParent(Id),
    #[error("post {0} does not exist")]
    InvalidPost(Id),
    #[error("invalid id: {0}")]
    InvalidId(Id),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Id },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::CommentNotFound(id) => ServiceError::NotFound {
                entity: "comment",
                id,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Deadline for a single entity store call.
    pub store: Duration,
    /// Deadline for a detached cache task.
    pub background: Duration,
}

pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = StoreResult<T>>,
) -> StoreResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout)?
}

pub(crate) fn ensure_positive(id: Id) -> Result<Id, ServiceError> {
    if id <= 0 {
        return Err(ServiceError::InvalidId(id));
    }
    Ok(id)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::time::Duration;

    use arbor_core::ports::CacheStore;
    use arbor_infra::memory::MemoryStore;

    use crate::cache::invalidation::InvalidationCoordinator;
    use crate::cache::{CacheLayer, CacheTtls};
    use crate::jobs::BackgroundTasks;
    use crate::service::{CommentService, PostService, Timeouts};

    pub struct Harness {
        pub store: MemoryStore,
        pub comments: CommentService,
        pub posts: PostService,
        pub background: BackgroundTasks,
    }

    impl Harness {
        pub fn new(cache: Arc<dyn CacheStore>) -> Self {
            let store = MemoryStore::new();
            let timeouts = Timeouts {
                store: Duration::from_secs(1),
                background: Duration::from_secs(1),
            };
            let ttls = CacheTtls {
                listing: Duration::from_secs(60),
                subtree: Duration::from_secs(60),
                entry: Duration::from_secs(60),
            };
            let background = BackgroundTasks::new();
            let cache = CacheLayer::new(cache, Duration::from_secs(1), ttls);
            let comment_store = Arc::new(store.clone());
            let post_store = Arc::new(store.clone());
            let invalidation = InvalidationCoordinator::new(
                cache.clone(),
                comment_store.clone(),
                background.clone(),
                timeouts,
            );
            Self {
                comments: CommentService::new(
                    comment_store,
                    post_store.clone(),
                    cache.clone(),
                    invalidation.clone(),
                    background.clone(),
                    timeouts,
                ),
                posts: PostService::new(post_store, cache, invalidation, background.clone(), timeouts),
                store,
                background,
            }
        }

        pub async fn settle(&self) {
            self.background.wait_idle().await;
        }
    }
}
