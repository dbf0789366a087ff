use async_trait::async_trait;

use arbor_core::domain::Id;
use arbor_core::domain::comments::{Comment, NewComment};
use arbor_core::domain::listing::{CommentSort, ListQuery, PostSort};
use arbor_core::domain::posts::{NewPost, Post};
use arbor_core::error::StoreError;
use arbor_core::ports::{CommentStore, PostStore, StoreResult};

use super::{CommentsRepoError, DbPool, PostsRepoError, comments_repo, posts_repo};

/// Postgres-backed entity store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl From<CommentsRepoError> for StoreError {
    fn from(err: CommentsRepoError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<PostsRepoError> for StoreError {
    fn from(err: PostsRepoError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn create_comment(&self, new: NewComment) -> StoreResult<Comment> {
        Ok(comments_repo::insert_comment(&self.pool, &new).await?)
    }

    async fn get_comment(&self, id: Id) -> StoreResult<Option<Comment>> {
        Ok(comments_repo::find_comment(&self.pool, id).await?)
    }

    async fn comment_exists(&self, id: Id) -> StoreResult<bool> {
        Ok(comments_repo::comment_exists(&self.pool, id).await?)
    }

    async fn get_descendants(&self, root_id: Id) -> StoreResult<Vec<Comment>> {
        Ok(comments_repo::list_descendants(&self.pool, root_id).await?)
    }

    async fn ancestor_ids(&self, id: Id) -> StoreResult<Vec<Id>> {
        Ok(comments_repo::list_ancestor_ids(&self.pool, id).await?)
    }

    async fn delete_subtree(&self, id: Id) -> StoreResult<u64> {
        Ok(comments_repo::delete_subtree(&self.pool, id).await?)
    }

    async fn list_root_comments(
        &self,
        post_id: Option<Id>,
        query: &ListQuery<CommentSort>,
    ) -> StoreResult<(Vec<Comment>, i64)> {
        Ok(comments_repo::list_root_comments(&self.pool, post_id, query).await?)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn create_post(&self, new: NewPost) -> StoreResult<Post> {
        Ok(posts_repo::insert_post(&self.pool, &new).await?)
    }

    async fn get_post(&self, id: Id) -> StoreResult<Option<Post>> {
        Ok(posts_repo::find_post(&self.pool, id).await?)
    }

    async fn post_exists(&self, id: Id) -> StoreResult<bool> {
        Ok(posts_repo::post_exists(&self.pool, id).await?)
    }

    async fn delete_post(&self, id: Id) -> StoreResult<bool> {
        Ok(posts_repo::delete_post(&self.pool, id).await?)
    }

    async fn list_posts(&self, query: &ListQuery<PostSort>) -> StoreResult<(Vec<Post>, i64)> {
        Ok(posts_repo::list_posts(&self.pool, query).await?)
    }

    async fn comment_count(&self, post_id: Id) -> StoreResult<i64> {
        Ok(comments_repo::count_thread_comments(&self.pool, post_id).await?)
    }
}
