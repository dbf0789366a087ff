use std::time::Duration;

use tracing::warn;

use arbor_core::domain::Id;
use arbor_core::domain::comments::Comment;
use arbor_core::error::CacheError;

use crate::cache::client::CacheClient;
use crate::cache::keys;

/// Cache-aside wrapper for the reply tree under one comment.
///
/// Holds the flat descendant rows, root inclusive, as returned by
/// `CommentStore::get_descendants`. Readers rebuild the tree with
/// `build_reply_tree`, so the encoded value stays flat however deep the
/// thread goes.
#[derive(Clone)]
pub struct SubtreeCache {
    client: CacheClient,
    ttl: Duration,
}

impl SubtreeCache {
    pub fn new(client: CacheClient, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    /// `None` on a miss and on any cache failure.
    pub async fn get(&self, root_id: Id) -> Option<Vec<Comment>> {
        match self.client.get_json(&keys::subtree(root_id)).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, root_id, "subtree cache read failed");
                None
            }
        }
    }

    pub async fn set(&self, root_id: Id, rows: &[Comment]) {
        if let Err(err) = self
            .client
            .set_json(&keys::subtree(root_id), rows, Some(self.ttl))
            .await
        {
            warn!(error = %err, root_id, "subtree cache write failed");
        }
    }

    pub async fn invalidate(&self, root_id: Id) -> Result<(), CacheError> {
        self.client.delete(&keys::subtree(root_id)).await
    }
}
