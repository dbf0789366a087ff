//! Cache-aside wrappers over the configured [`CacheStore`].
//!
//! Nothing in here ever fails a request: reads degrade to misses and writes
//! are logged and dropped. Invalidation is the one path that reports errors,
//! so the coordinator can log which target was left stale.

pub mod client;
pub mod entries;
pub mod invalidation;
pub mod keys;
pub mod listing;
pub mod subtree;

use std::sync::Arc;
use std::time::Duration;

use arbor_core::domain::comments::Comment;
use arbor_core::domain::posts::Post;
use arbor_core::ports::CacheStore;

use crate::cache::client::CacheClient;
use crate::cache::entries::{CommentCountCache, PostEntryCache};
use crate::cache::listing::ListingCache;
use crate::cache::subtree::SubtreeCache;

#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub listing: Duration,
    pub subtree: Duration,
    pub entry: Duration,
}

/// Every cache family, sharing one store.
#[derive(Clone)]
pub struct CacheLayer {
    pub subtrees: SubtreeCache,
    pub comment_listings: ListingCache<Comment>,
    pub post_listings: ListingCache<Post>,
    pub posts: PostEntryCache,
    pub counts: CommentCountCache,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn CacheStore>, timeout: Duration, ttls: CacheTtls) -> Self {
        let client = CacheClient::new(store, timeout);
        Self {
            subtrees: SubtreeCache::new(client.clone(), ttls.subtree),
            comment_listings: ListingCache::new(client.clone(), ttls.listing),
            post_listings: ListingCache::new(client.clone(), ttls.listing),
            posts: PostEntryCache::new(client.clone(), ttls.entry),
            counts: CommentCountCache::new(client, ttls.entry),
        }
    }
}
