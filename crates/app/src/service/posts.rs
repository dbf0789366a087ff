use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use arbor_core::domain::Id;
use arbor_core::domain::listing::{ListParams, ListQuery, Listing, PostSort};
use arbor_core::domain::posts::{NewPost, Post};
use arbor_core::ports::PostStore;

use crate::cache::CacheLayer;
use crate::cache::invalidation::{InvalidationCoordinator, WriteEvent};
use crate::cache::keys::ListingScope;
use crate::cache::listing::ListingLookup;
use crate::jobs::BackgroundTasks;
use crate::service::{ServiceError, Timeouts, bounded, ensure_positive};

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
    cache: CacheLayer,
    invalidation: InvalidationCoordinator,
    background: BackgroundTasks,
    timeouts: Timeouts,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostStore>,
        cache: CacheLayer,
        invalidation: InvalidationCoordinator,
        background: BackgroundTasks,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            posts,
            cache,
            invalidation,
            background,
            timeouts,
        }
    }

    pub async fn create_post(&self, new: NewPost) -> Result<Post, ServiceError> {
        new.validate()?;
        let post = bounded(self.timeouts.store, self.posts.create_post(new)).await?;
        info!(post_id = post.id, "post created");
        self.invalidation
            .committed(WriteEvent::PostCreated { id: post.id });
        Ok(post)
    }

    pub async fn list_posts(&self, params: ListParams) -> Result<Listing<Post>, ServiceError> {
        let query = ListQuery::<PostSort>::normalize(params);
        let mut listing = match self.cache.post_listings.get(ListingScope::Posts, &query).await {
            ListingLookup::Hit(listing) => listing,
            ListingLookup::Miss { fill } => {
                let (items, total) =
                    bounded(self.timeouts.store, self.posts.list_posts(&query)).await?;
                let listing = Listing::new(items, total, query.page, query.page_size);
                if let Some(key) = fill {
                    let listings = self.cache.post_listings.clone();
                    let snapshot = listing.clone();
                    self.background
                        .spawn("listing_fill", self.timeouts.background, async move {
                            listings.set(&key, &snapshot).await;
                        });
                }
                listing
            }
        };

        let counts = join_all(listing.items.iter().map(|post| self.comment_count(post.id))).await;
        for (post, count) in listing.items.iter_mut().zip(counts) {
            post.comment_count = count;
        }
        Ok(listing)
    }

    pub async fn get_post_by_id(&self, id: Id) -> Result<Post, ServiceError> {
        let id = ensure_positive(id)?;
        let mut post = match self.cache.posts.get(id).await {
            Some(post) => post,
            None => {
                let post = bounded(self.timeouts.store, self.posts.get_post(id))
                    .await?
                    .ok_or(ServiceError::NotFound { entity: "post", id })?;
                let entries = self.cache.posts.clone();
                let snapshot = post.clone();
                self.background
                    .spawn("post_fill", self.timeouts.background, async move {
                        entries.set(&snapshot).await;
                    });
                post
            }
        };
        post.comment_count = self.comment_count(id).await;
        Ok(post)
    }

    pub async fn delete_post(&self, id: Id) -> Result<(), ServiceError> {
        let id = ensure_positive(id)?;
        let removed = bounded(self.timeouts.store, self.posts.delete_post(id)).await?;
        if !removed {
            return Err(ServiceError::NotFound { entity: "post", id });
        }
        info!(post_id = id, "post deleted");
        self.invalidation.committed(WriteEvent::PostDeleted { id });
        Ok(())
    }

    /// Number of comments in the post's thread. A store failure degrades to 0
    /// and is not cached.
    pub async fn comment_count(&self, post_id: Id) -> i64 {
        if let Some(count) = self.cache.counts.get(post_id).await {
            return count;
        }
        match bounded(self.timeouts.store, self.posts.comment_count(post_id)).await {
            Ok(count) => {
                let counts = self.cache.counts.clone();
                self.background
                    .spawn("count_fill", self.timeouts.background, async move {
                        counts.set(post_id, count).await;
                    });
                count
            }
            Err(err) => {
                warn!(error = %err, post_id, "comment count lookup failed");
                0
            }
        }
    }
}
