use std::sync::Arc;

use tracing::{info, warn};

use arbor_core::domain::Id;
use arbor_core::domain::comments::{Comment, NewComment, check_reply_depth};
use arbor_core::domain::listing::{CommentSort, ListParams, ListQuery, Listing};
use arbor_core::domain::tree::build_reply_tree;
use arbor_core::ports::{CommentStore, PostStore};

use crate::cache::CacheLayer;
use crate::cache::invalidation::{InvalidationCoordinator, WriteEvent};
use crate::cache::keys::ListingScope;
use crate::cache::listing::ListingLookup;
use crate::jobs::BackgroundTasks;
use crate::service::{ServiceError, Timeouts, bounded, ensure_positive};

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentStore>,
    posts: Arc<dyn PostStore>,
    cache: CacheLayer,
    invalidation: InvalidationCoordinator,
    background: BackgroundTasks,
    timeouts: Timeouts,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentStore>,
        posts: Arc<dyn PostStore>,
        cache: CacheLayer,
        invalidation: InvalidationCoordinator,
        background: BackgroundTasks,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            comments,
            posts,
            cache,
            invalidation,
            background,
            timeouts,
        }
    }

    pub async fn create_comment(&self, new: NewComment) -> Result<Comment, ServiceError> {
        new.validate()?;
        if let Some(parent_id) = new.parent_id {
            let exists = parent_id > 0
                && bounded(self.timeouts.store, self.comments.comment_exists(parent_id)).await?;
            if !exists {
                return Err(ServiceError::InvalidParent(parent_id));
            }
            let ancestors =
                bounded(self.timeouts.store, self.comments.ancestor_ids(parent_id)).await?;
            check_reply_depth(ancestors.len())?;
        }
        if let Some(post_id) = new.post_id {
            let exists = post_id > 0
                && bounded(self.timeouts.store, self.posts.post_exists(post_id)).await?;
            if !exists {
                return Err(ServiceError::InvalidPost(post_id));
            }
        }

        let comment = bounded(self.timeouts.store, self.comments.create_comment(new)).await?;
        info!(
            comment_id = comment.id,
            parent_id = ?comment.parent_id,
            post_id = ?comment.post_id,
            "comment created"
        );
        self.invalidation.committed(WriteEvent::CommentCreated {
            id: comment.id,
            parent_id: comment.parent_id,
            post_id: comment.post_id,
        });
        Ok(comment)
    }

    /// With a parent: that comment carrying its full reply tree, as a
    /// single-item listing. Without: one page of root-level comments,
    /// optionally restricted to a thread.
    pub async fn list_comments(
        &self,
        parent_id: Option<Id>,
        post_id: Option<Id>,
        params: ListParams,
    ) -> Result<Listing<Comment>, ServiceError> {
        match parent_id {
            Some(parent_id) => self.subtree(parent_id).await.map(Listing::single),
            None => self.root_listing(post_id, params).await,
        }
    }

    async fn subtree(&self, root_id: Id) -> Result<Comment, ServiceError> {
        let root_id = ensure_positive(root_id)?;
        let mut root = bounded(self.timeouts.store, self.comments.get_comment(root_id))
            .await?
            .ok_or(ServiceError::NotFound {
                entity: "comment",
                id: root_id,
            })?;

        if let Some(rows) = self.cache.subtrees.get(root_id).await {
            match build_reply_tree(root_id, rows) {
                Ok(tree) => {
                    root.children = tree;
                    return Ok(root);
                }
                Err(err) => warn!(error = %err, root_id, "cached subtree rows unusable"),
            }
        }

        let rows = bounded(self.timeouts.store, self.comments.get_descendants(root_id)).await?;
        let subtrees = self.cache.subtrees.clone();
        let snapshot = rows.clone();
        self.background
            .spawn("subtree_fill", self.timeouts.background, async move {
                subtrees.set(root_id, &snapshot).await;
            });
        root.children = build_reply_tree(root_id, rows)?;
        Ok(root)
    }

    async fn root_listing(
        &self,
        post_id: Option<Id>,
        params: ListParams,
    ) -> Result<Listing<Comment>, ServiceError> {
        let query = ListQuery::<CommentSort>::normalize(params);
        let scope = ListingScope::RootComments { post_id };
        let fill = match self.cache.comment_listings.get(scope, &query).await {
            ListingLookup::Hit(listing) => return Ok(listing),
            ListingLookup::Miss { fill } => fill,
        };

        let (items, total) = bounded(
            self.timeouts.store,
            self.comments.list_root_comments(post_id, &query),
        )
        .await?;
        let listing = Listing::new(items, total, query.page, query.page_size);
        if let Some(key) = fill {
            let listings = self.cache.comment_listings.clone();
            let snapshot = listing.clone();
            self.background
                .spawn("listing_fill", self.timeouts.background, async move {
                    listings.set(&key, &snapshot).await;
                });
        }
        Ok(listing)
    }

    /// Deletes the comment and every reply beneath it. Returns the number of
    /// comments removed.
    pub async fn delete_comment(&self, id: Id) -> Result<u64, ServiceError> {
        let id = ensure_positive(id)?;
        let not_found = ServiceError::NotFound {
            entity: "comment",
            id,
        };
        let Some(comment) = bounded(self.timeouts.store, self.comments.get_comment(id)).await?
        else {
            return Err(not_found);
        };
        let removed = bounded(self.timeouts.store, self.comments.delete_subtree(id)).await?;
        if removed == 0 {
            return Err(not_found);
        }
        info!(comment_id = id, removed, "comment subtree deleted");
        self.invalidation.committed(WriteEvent::CommentDeleted {
            id,
            parent_id: comment.parent_id,
            post_id: comment.post_id,
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::service::testing::Harness;
    use arbor_core::domain::posts::NewPost;
    use arbor_core::error::ValidationError;
    use arbor_infra::cache::{DisabledCacheStore, MemoryCacheStore};

    fn reply(content: &str, author: &str, parent_id: Option<Id>, post_id: Option<Id>) -> NewComment {
        NewComment {
            content: content.to_string(),
            author: author.to_string(),
            parent_id,
            post_id,
        }
    }

    async fn thread(harness: &Harness) -> Id {
        harness
            .posts
            .create_post(NewPost {
                title: "P1".to_string(),
                content: "body".to_string(),
                author: "writer".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn memory_harness() -> Harness {
        Harness::new(Arc::new(MemoryCacheStore::new()))
    }

    #[tokio::test]
    async fn reply_tree_under_root_comment() {
        let harness = memory_harness();
        let post_id = thread(&harness).await;
        let c1 = harness
            .comments
            .create_comment(reply("hi", "ab", None, Some(post_id)))
            .await
            .unwrap();
        let c2 = harness
            .comments
            .create_comment(reply("reply", "cd", Some(c1.id), None))
            .await
            .unwrap();
        assert_eq!(c2.post_id, Some(post_id));

        let listing = harness
            .comments
            .list_comments(Some(c1.id), None, ListParams::default())
            .await
            .unwrap();
        assert_eq!(listing.total, 1);
        assert_eq!(listing.page_size, 1);
        let root = &listing.items[0];
        assert_eq!(root.id, c1.id);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id, c2.id);
        assert!(root.children[0].children.is_empty());
    }

    #[tokio::test]
    async fn deleted_root_disappears_from_listing_and_subtree() {
        let harness = memory_harness();
        let post_id = thread(&harness).await;
        let c1 = harness
            .comments
            .create_comment(reply("hi", "ab", None, Some(post_id)))
            .await
            .unwrap();
        harness
            .comments
            .create_comment(reply("reply", "cd", Some(c1.id), None))
            .await
            .unwrap();

        // Warm both caches before deleting.
        harness
            .comments
            .list_comments(None, Some(post_id), ListParams::default())
            .await
            .unwrap();
        harness
            .comments
            .list_comments(Some(c1.id), None, ListParams::default())
            .await
            .unwrap();
        harness.settle().await;

        assert_eq!(harness.comments.delete_comment(c1.id).await.unwrap(), 2);
        harness.settle().await;
        assert_eq!(harness.store.comment_rows().await, 0);

        let listing = harness
            .comments
            .list_comments(None, Some(post_id), ListParams::default())
            .await
            .unwrap();
        assert!(listing.items.iter().all(|comment| comment.id != c1.id));
        assert_eq!(listing.total, 0);

        let err = harness
            .comments
            .list_comments(Some(c1.id), None, ListParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "comment", .. }));
    }

    #[tokio::test]
    async fn root_listing_is_served_from_cache_until_invalidated() {
        let harness = memory_harness();
        let post_id = thread(&harness).await;
        let c1 = harness
            .comments
            .create_comment(reply("original", "ab", None, Some(post_id)))
            .await
            .unwrap();
        harness.settle().await;

        harness
            .comments
            .list_comments(None, Some(post_id), ListParams::default())
            .await
            .unwrap();
        harness.settle().await;

        assert!(harness.store.rewrite_comment(c1.id, "rewritten").await);
        let cached = harness
            .comments
            .list_comments(None, Some(post_id), ListParams::default())
            .await
            .unwrap();
        assert_eq!(cached.items[0].content, "original");

        let c2 = harness
            .comments
            .create_comment(reply("second", "cd", None, Some(post_id)))
            .await
            .unwrap();
        harness.settle().await;

        let fresh = harness
            .comments
            .list_comments(None, Some(post_id), ListParams::default())
            .await
            .unwrap();
        assert_eq!(fresh.total, 2);
        assert!(fresh.items.iter().any(|comment| comment.id == c2.id));
        assert!(fresh.items.iter().any(|comment| comment.content == "rewritten"));
    }

    #[tokio::test]
    async fn new_reply_evicts_ancestor_subtrees() {
        let harness = memory_harness();
        let c1 = harness
            .comments
            .create_comment(reply("root", "ab", None, None))
            .await
            .unwrap();
        let c2 = harness
            .comments
            .create_comment(reply("mid", "ab", Some(c1.id), None))
            .await
            .unwrap();
        harness.settle().await;
        harness
            .comments
            .list_comments(Some(c1.id), None, ListParams::default())
            .await
            .unwrap();
        harness.settle().await;

        let c3 = harness
            .comments
            .create_comment(reply("leaf", "ab", Some(c2.id), None))
            .await
            .unwrap();
        harness.settle().await;

        let listing = harness
            .comments
            .list_comments(Some(c1.id), None, ListParams::default())
            .await
            .unwrap();
        let mid = &listing.items[0].children[0];
        assert_eq!(mid.id, c2.id);
        assert_eq!(mid.children.len(), 1);
        assert_eq!(mid.children[0].id, c3.id);
    }

    #[tokio::test]
    async fn disabled_cache_gives_identical_results() {
        async fn scenario(harness: &Harness) -> (Listing<Comment>, Listing<Comment>) {
            let post_id = thread(harness).await;
            let mut roots = Vec::new();
            for n in 0..15 {
                let comment = harness
                    .comments
                    .create_comment(reply(&format!("note {n}"), "ab", None, Some(post_id)))
                    .await
                    .unwrap();
                roots.push(comment.id);
            }
            harness
                .comments
                .create_comment(reply("nested", "cd", Some(roots[0]), None))
                .await
                .unwrap();
            harness.settle().await;

            let params = ListParams {
                page: Some(2),
                sort_by: Some("id".to_string()),
                sort_order: Some("asc".to_string()),
                ..ListParams::default()
            };
            // Read twice so the cached harness answers from the cache.
            for _ in 0..2 {
                harness
                    .comments
                    .list_comments(None, Some(post_id), params.clone())
                    .await
                    .unwrap();
                harness.settle().await;
            }
            let page = harness
                .comments
                .list_comments(None, Some(post_id), params)
                .await
                .unwrap();
            let subtree = harness
                .comments
                .list_comments(Some(roots[0]), None, ListParams::default())
                .await
                .unwrap();
            (page, subtree)
        }

        let cached = scenario(&memory_harness()).await;
        let uncached = scenario(&Harness::new(Arc::new(DisabledCacheStore))).await;
        assert_eq!(cached.0.total, 15);
        assert_eq!(cached.0.items.len(), 5);
        assert!(!cached.0.has_next);
        assert!(cached.0.has_prev);
        assert_eq!(shape(&cached.0), shape(&uncached.0));
        assert_eq!(shape(&cached.1), shape(&uncached.1));
    }

    /// Listing contents minus store-assigned timestamps.
    fn shape(listing: &Listing<Comment>) -> (i64, bool, bool, Vec<(Id, String, Vec<Id>)>) {
        let items = listing
            .items
            .iter()
            .map(|comment| {
                let children = comment.children.iter().map(|child| child.id).collect();
                (comment.id, comment.content.clone(), children)
            })
            .collect();
        (listing.total, listing.has_next, listing.has_prev, items)
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let harness = memory_harness();
        let err = harness
            .comments
            .create_comment(reply("", "ab", None, None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::Required { field: "content" })
        ));

        let err = harness
            .comments
            .create_comment(reply("hi", "ab", Some(99), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidParent(99)));

        let err = harness
            .comments
            .create_comment(reply("hi", "ab", None, Some(42)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidPost(42)));
        assert_eq!(harness.store.comment_rows().await, 0);
    }

    #[tokio::test]
    async fn delete_checks_the_id() {
        let harness = memory_harness();
        assert!(matches!(
            harness.comments.delete_comment(0).await,
            Err(ServiceError::InvalidId(0))
        ));
        assert!(matches!(
            harness.comments.delete_comment(7).await,
            Err(ServiceError::NotFound { entity: "comment", id: 7 })
        ));
    }

    #[tokio::test]
    async fn deleting_a_reply_keeps_its_parent() {
        let harness = memory_harness();
        let c1 = harness
            .comments
            .create_comment(reply("root", "ab", None, None))
            .await
            .unwrap();
        let c2 = harness
            .comments
            .create_comment(reply("child", "ab", Some(c1.id), None))
            .await
            .unwrap();
        harness
            .comments
            .create_comment(reply("grandchild", "ab", Some(c2.id), None))
            .await
            .unwrap();
        harness
            .comments
            .list_comments(Some(c1.id), None, ListParams::default())
            .await
            .unwrap();
        harness.settle().await;

        assert_eq!(harness.comments.delete_comment(c2.id).await.unwrap(), 2);
        harness.settle().await;

        let listing = harness
            .comments
            .list_comments(Some(c1.id), None, ListParams::default())
            .await
            .unwrap();
        assert!(listing.items[0].children.is_empty());
        assert_eq!(harness.store.comment_rows().await, 1);
    }

    #[tokio::test]
    async fn replies_stop_at_the_depth_limit() {
        use arbor_core::domain::comments::MAX_REPLY_DEPTH;

        let harness = memory_harness();
        let mut parent = harness
            .comments
            .create_comment(reply("level 1", "ab", None, None))
            .await
            .unwrap()
            .id;
        for level in 2..=MAX_REPLY_DEPTH {
            parent = harness
                .comments
                .create_comment(reply(&format!("level {level}"), "ab", Some(parent), None))
                .await
                .unwrap()
                .id;
        }

        let err = harness
            .comments
            .create_comment(reply("too deep", "ab", Some(parent), None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::TooDeep { max: MAX_REPLY_DEPTH })
        ));
        assert_eq!(harness.store.comment_rows().await, MAX_REPLY_DEPTH);
        harness.settle().await;
    }

    #[tokio::test]
    async fn deep_subtree_is_served_from_cache() {
        let harness = memory_harness();
        let root = harness
            .store
            .create_comment(reply("level 1", "ab", None, None))
            .await
            .unwrap()
            .id;
        let mut deepest = root;
        for level in 2..=100 {
            deepest = harness
                .store
                .create_comment(reply(&format!("level {level}"), "ab", Some(deepest), None))
                .await
                .unwrap()
                .id;
        }

        harness
            .comments
            .list_comments(Some(root), None, ListParams::default())
            .await
            .unwrap();
        harness.settle().await;

        assert!(harness.store.rewrite_comment(deepest, "rewritten").await);
        let listing = harness
            .comments
            .list_comments(Some(root), None, ListParams::default())
            .await
            .unwrap();

        let mut node = &listing.items[0];
        let mut depth = 1;
        while let Some(child) = node.children.first() {
            node = child;
            depth += 1;
        }
        assert_eq!(depth, 100);
        assert_eq!(node.id, deepest);
        assert_eq!(node.content, "level 100");
    }

    #[tokio::test]
    async fn deleting_a_comment_refreshes_the_thread_count() {
        let harness = memory_harness();
        let post_id = thread(&harness).await;
        harness
            .comments
            .create_comment(reply("first", "ab", None, Some(post_id)))
            .await
            .unwrap();
        let second = harness
            .comments
            .create_comment(reply("second", "ab", None, Some(post_id)))
            .await
            .unwrap();
        harness.settle().await;

        assert_eq!(harness.posts.get_post_by_id(post_id).await.unwrap().comment_count, 2);
        harness.settle().await;

        harness.comments.delete_comment(second.id).await.unwrap();
        harness.settle().await;
        assert_eq!(harness.posts.get_post_by_id(post_id).await.unwrap().comment_count, 1);
    }
}
