//! Capability traits for the external collaborators.
//!
//! The entity store is authoritative; the cache store only ever holds
//! disposable projections of it.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::Id;
use crate::domain::comments::{Comment, NewComment};
use crate::domain::listing::{CommentSort, ListQuery, PostSort};
use crate::domain::posts::{NewPost, Post};
use crate::error::{CacheError, StoreError};

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Inserts a comment. A reply takes the thread of its parent.
    async fn create_comment(&self, new: NewComment) -> StoreResult<Comment>;

    async fn get_comment(&self, id: Id) -> StoreResult<Option<Comment>>;

    async fn comment_exists(&self, id: Id) -> StoreResult<bool>;

    /// Flat rows of `root_id` and all of its transitive replies, root
    /// inclusive. Empty when the root does not exist.
    async fn get_descendants(&self, root_id: Id) -> StoreResult<Vec<Comment>>;

    /// Ids of every ancestor of `id`, nearest first, `id` excluded.
    async fn ancestor_ids(&self, id: Id) -> StoreResult<Vec<Id>>;

    /// Atomically deletes `id` and every transitive reply. Returns the number
    /// of rows removed.
    async fn delete_subtree(&self, id: Id) -> StoreResult<u64>;

    /// One page of root-level comments, optionally restricted to a thread,
    /// together with the total number of matches.
    async fn list_root_comments(
        &self,
        post_id: Option<Id>,
        query: &ListQuery<CommentSort>,
    ) -> StoreResult<(Vec<Comment>, i64)>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, new: NewPost) -> StoreResult<Post>;

    async fn get_post(&self, id: Id) -> StoreResult<Option<Post>>;

    async fn post_exists(&self, id: Id) -> StoreResult<bool>;

    /// Deletes the post and every comment of its thread. Returns whether a
    /// post row was removed.
    async fn delete_post(&self, id: Id) -> StoreResult<bool>;

    async fn list_posts(&self, query: &ListQuery<PostSort>) -> StoreResult<(Vec<Post>, i64)>;

    async fn comment_count(&self, post_id: Id) -> StoreResult<i64>;
}

/// Key-value cache without cross-key guarantees.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
