pub mod background;
pub mod scheduler;

use thiserror::Error;
use tracing::{debug, info};

use crate::state::AppState;
use arbor_core::error::{CacheError, StoreError};

pub use background::BackgroundTasks;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Runs the periodic jobs. Returns immediately when none apply to the
/// configured backends.
pub async fn start(state: AppState) -> Result<(), JobError> {
    let Some(cache) = state.memory_cache.clone() else {
        info!(cache = state.backends.cache, "no periodic jobs for this cache backend");
        return Ok(());
    };
    let period = state.config.cache_sweep_interval;
    info!(interval_secs = period.as_secs(), "cache sweep scheduled");
    scheduler::run_interval("cache_sweep", period, move || {
        let cache = cache.clone();
        async move {
            let purged = cache.purge_expired().await;
            debug!(purged, "cache sweep complete");
            Ok(())
        }
    })
    .await
}
