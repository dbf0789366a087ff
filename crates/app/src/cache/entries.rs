use std::time::Duration;

use tracing::warn;

use arbor_core::domain::Id;
use arbor_core::domain::posts::Post;
use arbor_core::error::CacheError;

use crate::cache::client::CacheClient;
use crate::cache::keys;

/// Single-post entries. Stored without a meaningful comment count; readers
/// resolve the count through [`CommentCountCache`].
#[derive(Clone)]
pub struct PostEntryCache {
    client: CacheClient,
    ttl: Duration,
}

impl PostEntryCache {
    pub fn new(client: CacheClient, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    pub async fn get(&self, id: Id) -> Option<Post> {
        match self.client.get_json(&keys::post(id)).await {
            Ok(post) => post,
            Err(err) => {
                warn!(error = %err, post_id = id, "post cache read failed");
                None
            }
        }
    }

    pub async fn set(&self, post: &Post) {
        if let Err(err) = self
            .client
            .set_json(&keys::post(post.id), post, Some(self.ttl))
            .await
        {
            warn!(error = %err, post_id = post.id, "post cache write failed");
        }
    }

    pub async fn invalidate(&self, id: Id) -> Result<(), CacheError> {
        self.client.delete(&keys::post(id)).await
    }
}

#[derive(Clone)]
pub struct CommentCountCache {
    client: CacheClient,
    ttl: Duration,
}

impl CommentCountCache {
    pub fn new(client: CacheClient, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    pub async fn get(&self, post_id: Id) -> Option<i64> {
        match self.client.get_json(&keys::comment_count(post_id)).await {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, post_id, "comment count cache read failed");
                None
            }
        }
    }

    pub async fn set(&self, post_id: Id, count: i64) {
        if let Err(err) = self
            .client
            .set_json(&keys::comment_count(post_id), &count, Some(self.ttl))
            .await
        {
            warn!(error = %err, post_id, "comment count cache write failed");
        }
    }

    pub async fn invalidate(&self, post_id: Id) -> Result<(), CacheError> {
        self.client.delete(&keys::comment_count(post_id)).await
    }
}
