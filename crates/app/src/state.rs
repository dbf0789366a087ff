use std::sync::Arc;

use crate::config::AppConfig;
use crate::jobs::BackgroundTasks;
use crate::service::{CommentService, PostService};
use arbor_infra::cache::MemoryCacheStore;

#[derive(Debug, Clone, Copy)]
pub struct Backends {
    pub store: &'static str,
    pub cache: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub comments: CommentService,
    pub posts: PostService,
    pub background: BackgroundTasks,
    /// Set when the in-process cache is in use, for the sweep job.
    pub memory_cache: Option<Arc<MemoryCacheStore>>,
    pub backends: Backends,
}
